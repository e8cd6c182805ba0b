//! Keyword tagging against the taxonomy.

use std::collections::{BTreeSet, HashMap};

use regex::Regex;

use threadsift_core::{Category, Error, Result};

use crate::taxonomy::Taxonomy;

/// Tags normalized text with the trigger terms of its own category.
///
/// Matching is whole-word and case-insensitive: "aws" matches "using aws for"
/// but never the inside of "jaws". A record whose tag set comes back empty is
/// dropped by the clean stage, so the tagger doubles as a relevance filter.
pub struct Tagger {
    matchers: HashMap<Category, Vec<(String, Regex)>>,
}

impl Tagger {
    /// Compile per-term word-boundary matchers for every category.
    pub fn new(taxonomy: &Taxonomy) -> Result<Self> {
        let mut matchers = HashMap::new();
        for (category, subcats) in &taxonomy.categories {
            let mut compiled = Vec::new();
            for terms in subcats.values() {
                for term in terms {
                    let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
                    let re = Regex::new(&pattern).map_err(|e| {
                        Error::Config(format!("bad taxonomy term {:?}: {}", term, e))
                    })?;
                    compiled.push((term.clone(), re));
                }
            }
            matchers.insert(*category, compiled);
        }
        Ok(Self { matchers })
    }

    /// All of `category`'s trigger terms occurring as whole words in `text`.
    pub fn tag(&self, text: &str, category: Category) -> BTreeSet<String> {
        self.matchers
            .get(&category)
            .map(|terms| {
                terms
                    .iter()
                    .filter(|(_, re)| re.is_match(text))
                    .map(|(term, _)| term.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Relevance is a pure function of the tag set: non-empty ⇔ relevant.
    pub fn is_relevant(keywords: &BTreeSet<String>) -> bool {
        !keywords.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger() -> Tagger {
        Tagger::new(&Taxonomy::default()).unwrap()
    }

    #[test]
    fn test_whole_word_match_included() {
        let tags = tagger().tag("we moved everything to aws last year", Category::Tech);
        assert!(tags.contains("aws"));
    }

    #[test]
    fn test_substring_not_matched() {
        // "aws" inside "jaws" must not count
        let tags = tagger().tag("watching jaws tonight", Category::Tech);
        assert!(!tags.contains("aws"));
        assert!(tags.is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let tags = tagger().tag("Procore and BLUEBEAM on site", Category::Construction);
        assert!(tags.contains("procore"));
        assert!(tags.contains("bluebeam"));
    }

    #[test]
    fn test_multi_word_term() {
        let tags = tagger().tag(
            "our active directory setup is a mess",
            Category::Tech,
        );
        assert!(tags.contains("active directory"));
    }

    #[test]
    fn test_only_own_category_terms_considered() {
        // "procore" is a Construction term; a Tech record must not pick it up
        let tags = tagger().tag("procore is mentioned here", Category::Tech);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_relevance_is_pure_function_of_set() {
        let empty = BTreeSet::new();
        assert!(!Tagger::is_relevant(&empty));
        let mut set = BTreeSet::new();
        set.insert("clio".to_string());
        assert!(Tagger::is_relevant(&set));
    }

    #[test]
    fn test_idempotent() {
        let t = tagger();
        let text = "jira tickets about docker and kubernetes";
        let first = t.tag(text, Category::Tech);
        let second = t.tag(text, Category::Tech);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
