//! The invoice identifier pattern.

use regex::Regex;

/// Compiled structural pattern for invoice identifiers.
///
/// Matches are returned exactly as they appear in the source text; no case
/// folding or whitespace normalization is applied.
#[derive(Debug, Clone)]
pub struct InvoicePattern {
    regex: Regex,
}

impl InvoicePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// All pattern matches in `text`, deduplicated, first-seen order.
    pub fn find_unique(&self, text: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for m in self.regex.find_iter(text) {
            if seen.insert(m.as_str()) {
                out.push(m.as_str().to_string());
            }
        }
        out
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_IDENTIFIER_PATTERN;

    fn default_pattern() -> InvoicePattern {
        InvoicePattern::new(DEFAULT_IDENTIFIER_PATTERN).unwrap()
    }

    #[test]
    fn finds_identifiers_in_text() {
        let p = default_pattern();
        let ids = p.find_unique("invoice FV/1/PL/2501 and FV/1234/PL/2502 here");
        assert_eq!(ids, vec!["FV/1/PL/2501", "FV/1234/PL/2502"]);
    }

    #[test]
    fn deduplicates_preserving_first_seen_order() {
        let p = default_pattern();
        let ids = p.find_unique("FV/2/PL/2501 FV/1/PL/2501 FV/2/PL/2501");
        assert_eq!(ids, vec!["FV/2/PL/2501", "FV/1/PL/2501"]);
    }

    #[test]
    fn ignores_tokens_outside_the_shape() {
        let p = default_pattern();
        assert!(p.find_unique("FV/PL/2501 FV/1/PL/25 ST/1").is_empty());
        // Year segment is exactly four digits; longer runs still contain a match
        assert_eq!(p.find_unique("FV/1/PL/25011"), vec!["FV/1/PL/2501"]);
    }

    #[test]
    fn custom_pattern_is_honored() {
        let p = InvoicePattern::new(r"INV-\d{4}").unwrap();
        assert_eq!(p.find_unique("see INV-0042."), vec!["INV-0042"]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(InvoicePattern::new("FV/(").is_err());
    }
}
