use crate::error::{AppError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

/// Outcome of classifying listing text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub flagged: bool,
    pub matched_terms: Vec<String>,
}

impl Verdict {
    pub fn clean() -> Self {
        Self {
            flagged: false,
            matched_terms: Vec::new(),
        }
    }
}

/// Scans listing text against a configured prohibited-term list plus a fixed
/// set of fraud patterns.
///
/// `classify` is pure: no I/O, deterministic for a given term list. The term
/// list is policy, loaded once at startup; the patterns are compiled here.
pub struct ListingClassifier {
    words: HashSet<String>,
    phrases: Vec<String>,
    patterns: Vec<(&'static str, Regex)>,
}

impl ListingClassifier {
    pub fn new(terms_file: impl AsRef<Path>) -> Result<Self> {
        let (words, phrases) = Self::load_terms(terms_file)?;
        let patterns = Self::compile_patterns();

        Ok(Self {
            words,
            phrases,
            patterns,
        })
    }

    /// Check listing title and description for prohibited content.
    ///
    /// Returns every matched term, not just the first, so moderation notes
    /// can enumerate all violations.
    pub fn classify(&self, title: &str, description: &str) -> Verdict {
        let text = format!("{} {}", title, description);
        if text.trim().is_empty() {
            return Verdict::clean();
        }

        let normalized = text.to_lowercase();
        let text_words: HashSet<&str> = normalized.unicode_words().collect();
        let mut matched: Vec<String> = Vec::new();

        for word in &self.words {
            if text_words.contains(word.as_str()) {
                tracing::debug!(term = %word, "prohibited term matched");
                matched.push(word.clone());
            }
        }

        for phrase in &self.phrases {
            if normalized.contains(phrase.as_str()) {
                tracing::debug!(term = %phrase, "prohibited phrase matched");
                matched.push(phrase.clone());
            }
        }

        for (label, pattern) in &self.patterns {
            if pattern.is_match(&normalized) {
                tracing::debug!(pattern = %label, "fraud pattern matched");
                matched.push((*label).to_string());
            }
        }

        matched.sort();
        matched.dedup();

        Verdict {
            flagged: !matched.is_empty(),
            matched_terms: matched,
        }
    }

    /// Load prohibited terms from a newline-delimited file.
    ///
    /// Single words match on word boundaries; entries containing whitespace
    /// match as substrings of the normalized text.
    fn load_terms(path: impl AsRef<Path>) -> Result<(HashSet<String>, Vec<String>)> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Config(format!(
                "failed to load prohibited terms from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let mut words = HashSet::new();
        let mut phrases = Vec::new();

        for line in content.lines() {
            let term = line.trim();
            if term.is_empty() || term.starts_with('#') {
                continue;
            }
            let term = term.to_lowercase();
            if term.split_whitespace().count() > 1 {
                phrases.push(term);
            } else {
                words.insert(term);
            }
        }

        Ok((words, phrases))
    }

    /// Compile regex patterns for fraud indicators that a flat term list
    /// cannot express
    fn compile_patterns() -> Vec<(&'static str, Regex)> {
        vec![
            (
                "off-platform payment request",
                Regex::new(r"\b(pay|send|deposit|transfer)\b[^.]{0,40}\b(paypal|venmo|zelle|bitcoin|crypto|gift\s?cards?)\b")
                    .expect("off-platform payment regex is valid"),
            ),
            (
                "upfront payment before viewing",
                Regex::new(r"\b(deposit|payment|fee)\b[^.]{0,40}\b(before|prior to)\b[^.]{0,40}\b(viewing|inspection|tour)\b")
                    .expect("upfront payment regex is valid"),
            ),
            (
                "contact outside listing",
                Regex::new(r"\b(whatsapp|telegram)\b[^.]{0,30}\b(\+?\d[\d\s().-]{7,})")
                    .expect("external contact regex is valid"),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_terms_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "moneygram").unwrap();
        writeln!(file, "# comment line").unwrap();
        writeln!(file, "").unwrap();
        writeln!(file, "western union").unwrap();
        writeln!(file, "no children").unwrap();
        file
    }

    #[test]
    fn test_load_terms_splits_words_and_phrases() {
        let file = create_test_terms_file();
        let classifier = ListingClassifier::new(file.path()).unwrap();

        assert_eq!(classifier.words.len(), 1);
        assert!(classifier.words.contains("moneygram"));
        assert_eq!(classifier.phrases.len(), 2);
    }

    #[test]
    fn test_clean_listing() {
        let file = create_test_terms_file();
        let classifier = ListingClassifier::new(file.path()).unwrap();

        let verdict = classifier.classify(
            "Luxury Condo",
            "Two-bedroom condo with a view of the marina.",
        );
        assert!(!verdict.flagged);
        assert!(verdict.matched_terms.is_empty());
    }

    #[test]
    fn test_word_match_is_case_insensitive() {
        let file = create_test_terms_file();
        let classifier = ListingClassifier::new(file.path()).unwrap();

        let verdict = classifier.classify("Great deal", "Payment via MoneyGram accepted.");
        assert!(verdict.flagged);
        assert_eq!(verdict.matched_terms, vec!["moneygram".to_string()]);
    }

    #[test]
    fn test_phrase_match() {
        let file = create_test_terms_file();
        let classifier = ListingClassifier::new(file.path()).unwrap();

        let verdict = classifier.classify("Cozy studio", "Quiet building, no children please.");
        assert!(verdict.flagged);
        assert!(verdict.matched_terms.contains(&"no children".to_string()));
    }

    #[test]
    fn test_all_matches_reported() {
        let file = create_test_terms_file();
        let classifier = ListingClassifier::new(file.path()).unwrap();

        let verdict = classifier.classify(
            "Pay by Western Union",
            "Or moneygram. Adults preferred, no children.",
        );
        assert!(verdict.flagged);
        assert_eq!(verdict.matched_terms.len(), 3);
    }

    #[test]
    fn test_fraud_pattern_match() {
        let file = create_test_terms_file();
        let classifier = ListingClassifier::new(file.path()).unwrap();

        let verdict = classifier.classify(
            "Downtown loft",
            "Send deposit via Zelle to secure the unit.",
        );
        assert!(verdict.flagged);
        assert!(verdict
            .matched_terms
            .contains(&"off-platform payment request".to_string()));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let file = create_test_terms_file();
        let classifier = ListingClassifier::new(file.path()).unwrap();

        let a = classifier.classify("Western Union only", "moneygram moneygram");
        let b = classifier.classify("Western Union only", "moneygram moneygram");
        assert_eq!(a, b);
    }
}
