//! Text normalization for tagging, sentiment, and embedding.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bhttps?://\S+|\bwww\.\S+").unwrap());
static NON_LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z\s]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, strip URLs and non-letters, collapse whitespace, and remove any
/// literal "nan" tokens left behind by missing-value formatting.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_urls = URL_RE.replace_all(&lowered, "");
    let letters_only = NON_LETTER_RE.replace_all(&no_urls, "");
    let collapsed = WHITESPACE_RE.replace_all(&letters_only, " ");

    // "nan" is what a missing title/content renders as; it must not survive
    // into tagging or sentiment as if it were a word.
    let cleaned: Vec<&str> = collapsed
        .trim()
        .split(' ')
        .filter(|token| !token.is_empty() && *token != "nan")
        .collect();
    cleaned.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("We LOVE Procore!!"), "we love procore");
    }

    #[test]
    fn test_strips_urls() {
        assert_eq!(
            normalize("see https://example.com/x?y=1 and www.site.org here"),
            "see and here"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("a\t\tb\n\nc   d"), "a b c d");
    }

    #[test]
    fn test_removes_literal_nan_tokens() {
        assert_eq!(normalize("nan broken tool nan"), "broken tool");
        // "nan" inside a word is untouched
        assert_eq!(normalize("nanotech"), "nanotech");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("nan"), "");
    }
}
