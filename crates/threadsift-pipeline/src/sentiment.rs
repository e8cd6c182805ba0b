//! Lexicon-based sentiment scoring and the negative-mention summary.
//!
//! A compound polarity score in [-1, 1] is computed from a static valence
//! lexicon with negation and booster handling, then thresholded into
//! positive/negative/neutral. Deterministic for a given lexicon and text.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Scaling factor shifting intensity when a booster precedes a scored word.
const BOOSTER_INCREMENT: f64 = 0.293;
/// Valence multiplier when a scored word is negated.
const NEGATION_FACTOR: f64 = -0.74;
/// Normalization constant mapping raw sums into [-1, 1].
const NORMALIZATION_ALPHA: f64 = 15.0;
/// How many preceding tokens are inspected for negations and boosters.
const CONTEXT_WINDOW: usize = 3;

/// Word valences, roughly on a [-4, 4] intensity scale.
static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let entries: &[(&str, f64)] = &[
        // positive
        ("good", 1.9),
        ("great", 3.1),
        ("excellent", 2.7),
        ("amazing", 2.8),
        ("awesome", 3.1),
        ("fantastic", 2.6),
        ("love", 3.2),
        ("loved", 2.9),
        ("like", 1.5),
        ("liked", 1.6),
        ("best", 3.2),
        ("better", 1.9),
        ("helpful", 1.8),
        ("useful", 1.9),
        ("easy", 1.9),
        ("easier", 1.8),
        ("intuitive", 1.7),
        ("reliable", 2.0),
        ("solid", 1.6),
        ("fast", 1.4),
        ("smooth", 1.6),
        ("happy", 2.7),
        ("glad", 2.0),
        ("recommend", 1.8),
        ("recommended", 1.9),
        ("works", 1.2),
        ("worked", 1.2),
        ("perfect", 2.7),
        ("nice", 1.8),
        ("clean", 1.5),
        ("powerful", 1.7),
        ("stable", 1.5),
        ("worth", 1.3),
        ("efficient", 1.8),
        ("flexible", 1.4),
        ("affordable", 1.6),
        ("free", 1.2),
        ("impressed", 2.2),
        ("impressive", 2.2),
        ("win", 2.4),
        ("saved", 1.6),
        ("thanks", 1.9),
        ("thank", 1.9),
        // negative
        ("bad", -2.5),
        ("worse", -2.1),
        ("worst", -3.1),
        ("terrible", -2.5),
        ("horrible", -2.5),
        ("awful", -2.0),
        ("hate", -2.7),
        ("hated", -2.5),
        ("useless", -1.8),
        ("broken", -1.9),
        ("breaks", -1.7),
        ("broke", -1.8),
        ("bug", -1.4),
        ("bugs", -1.5),
        ("buggy", -2.0),
        ("crash", -1.9),
        ("crashes", -1.9),
        ("crashed", -1.9),
        ("slow", -1.3),
        ("laggy", -1.5),
        ("expensive", -1.2),
        ("overpriced", -1.9),
        ("scam", -2.6),
        ("garbage", -2.2),
        ("trash", -2.1),
        ("annoying", -1.8),
        ("frustrating", -2.1),
        ("frustrated", -2.0),
        ("confusing", -1.5),
        ("clunky", -1.6),
        ("painful", -1.9),
        ("pain", -1.6),
        ("nightmare", -2.4),
        ("disappointed", -2.1),
        ("disappointing", -2.1),
        ("fail", -2.1),
        ("fails", -2.0),
        ("failed", -2.1),
        ("failure", -2.2),
        ("problem", -1.4),
        ("problems", -1.5),
        ("issue", -1.1),
        ("issues", -1.2),
        ("error", -1.3),
        ("errors", -1.4),
        ("difficult", -1.5),
        ("hard", -1.0),
        ("impossible", -1.9),
        ("unusable", -2.3),
        ("unreliable", -1.9),
        ("avoid", -1.6),
        ("wrong", -1.6),
        ("missing", -1.1),
        ("lost", -1.3),
        ("stuck", -1.4),
        ("outdated", -1.3),
        ("bloated", -1.5),
        ("regret", -2.0),
    ];
    entries.iter().copied().collect()
});

/// Words flipping the valence of a following scored word.
static NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "neither", "nor", "cant", "cannot", "wont", "dont",
    "doesnt", "didnt", "isnt", "wasnt", "shouldnt", "wouldnt", "couldnt", "without", "hardly",
    "barely",
];

/// Intensity modifiers: positive entries amplify, negative ones dampen.
static BOOSTERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let entries: &[(&str, f64)] = &[
        ("very", BOOSTER_INCREMENT),
        ("really", BOOSTER_INCREMENT),
        ("extremely", BOOSTER_INCREMENT),
        ("incredibly", BOOSTER_INCREMENT),
        ("absolutely", BOOSTER_INCREMENT),
        ("totally", BOOSTER_INCREMENT),
        ("so", BOOSTER_INCREMENT),
        ("super", BOOSTER_INCREMENT),
        ("slightly", -BOOSTER_INCREMENT),
        ("somewhat", -BOOSTER_INCREMENT),
        ("kinda", -BOOSTER_INCREMENT),
        ("barely", -BOOSTER_INCREMENT),
        ("marginally", -BOOSTER_INCREMENT),
    ];
    entries.iter().copied().collect()
});

/// Stopwords removed before the pain-point frequency summary.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "if", "then", "than", "that", "this", "these",
        "those", "is", "are", "was", "were", "be", "been", "being", "am", "do", "does", "did",
        "have", "has", "had", "will", "would", "can", "could", "should", "shall", "may", "might",
        "must", "i", "im", "ive", "me", "my", "mine", "we", "us", "our", "you", "your", "yours",
        "he", "him", "his", "she", "her", "hers", "it", "its", "they", "them", "their", "theirs",
        "what", "which", "who", "whom", "when", "where", "why", "how", "all", "any", "both",
        "each", "few", "more", "most", "some", "such", "only", "own", "same", "too", "very",
        "just", "dont", "doesnt", "didnt", "not", "no", "nor", "so", "to", "of", "in", "on",
        "at", "by", "for", "with", "about", "into", "through", "during", "before", "after",
        "from", "up", "down", "out", "off", "over", "under", "again", "there", "here", "as",
        "also", "get", "got", "like", "one", "use", "using", "used",
    ]
    .into_iter()
    .collect()
});

/// Sentiment label derived from the compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Compound-score sentiment analyzer with configurable cutoffs.
pub struct SentimentAnalyzer {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
}

impl SentimentAnalyzer {
    pub fn new(positive_threshold: f64, negative_threshold: f64) -> Self {
        Self {
            positive_threshold,
            negative_threshold,
        }
    }

    /// Compound polarity score in [-1, 1] for normalized text.
    pub fn compound(&self, text: &str) -> f64 {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut total = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&valence) = LEXICON.get(token) else {
                continue;
            };

            let mut scored = valence;
            let window_start = i.saturating_sub(CONTEXT_WINDOW);
            for prior in &tokens[window_start..i] {
                if let Some(&increment) = BOOSTERS.get(prior) {
                    scored += increment * scored.signum();
                }
                if NEGATIONS.contains(prior) {
                    scored *= NEGATION_FACTOR;
                }
            }
            total += scored;
        }

        total / (total * total + NORMALIZATION_ALPHA).sqrt()
    }

    /// Label the text by thresholding its compound score.
    pub fn label(&self, text: &str) -> SentimentLabel {
        let score = self.compound(text);
        if score > self.positive_threshold {
            SentimentLabel::Positive
        } else if score < self.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new(0.05, -0.05)
    }
}

/// Stopword-filtered tokens of a normalized text.
fn content_tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        .collect()
}

/// Most frequent single tokens across `texts`, stopwords removed.
pub fn top_unigrams(texts: &[&str], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for text in texts {
        for token in content_tokens(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    rank(counts, limit)
}

/// Most frequent adjacent token pairs across `texts`, stopwords removed.
pub fn top_bigrams(texts: &[&str], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        let tokens = content_tokens(text);
        for pair in tokens.windows(2) {
            *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
        }
    }
    rank(counts, limit)
}

fn rank<K: Into<String>>(counts: HashMap<K, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().map(|(k, v)| (k.into(), v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_label() {
        let analyzer = SentimentAnalyzer::default();
        assert_eq!(
            analyzer.label("procore is great and really easy"),
            SentimentLabel::Positive
        );
    }

    #[test]
    fn test_negative_label() {
        let analyzer = SentimentAnalyzer::default();
        assert_eq!(
            analyzer.label("the update is terrible and keeps crashing"),
            SentimentLabel::Negative
        );
    }

    #[test]
    fn test_neutral_when_no_scored_words() {
        let analyzer = SentimentAnalyzer::default();
        assert_eq!(analyzer.compound("the server restarted yesterday"), 0.0);
        assert_eq!(
            analyzer.label("the server restarted yesterday"),
            SentimentLabel::Neutral
        );
    }

    #[test]
    fn test_negation_flips_valence() {
        let analyzer = SentimentAnalyzer::default();
        assert!(analyzer.compound("good software") > 0.0);
        assert!(analyzer.compound("not good software") < 0.0);
    }

    #[test]
    fn test_booster_amplifies() {
        let analyzer = SentimentAnalyzer::default();
        let plain = analyzer.compound("good tool");
        let boosted = analyzer.compound("very good tool");
        assert!(boosted > plain);
    }

    #[test]
    fn test_deterministic() {
        let analyzer = SentimentAnalyzer::default();
        let text = "bluebeam is solid but the licensing is a nightmare";
        assert_eq!(analyzer.compound(text), analyzer.compound(text));
    }

    #[test]
    fn test_score_bounded() {
        let analyzer = SentimentAnalyzer::default();
        let gushing = "great great great amazing awesome best perfect love";
        let score = analyzer.compound(gushing);
        assert!(score > 0.0 && score <= 1.0);
    }

    #[test]
    fn test_top_unigrams_filters_stopwords() {
        let texts: Vec<&str> = vec!["the sync keeps failing", "sync errors again"];
        let top = top_unigrams(&texts, 5);
        assert_eq!(top[0].0, "sync");
        assert!(top.iter().all(|(word, _)| word != "the"));
    }

    #[test]
    fn test_top_bigrams_adjacent_pairs() {
        let texts: Vec<&str> = vec!["license server down", "license server unreachable"];
        let top = top_bigrams(&texts, 3);
        assert_eq!(top[0], ("license server".to_string(), 2));
    }
}
