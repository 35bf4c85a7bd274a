use regex::{Regex, RegexBuilder};

use crate::error::{AppError, AppResult};

/// Case-insensitive substring match on free text from clients.
///
/// The term is escaped before compiling, so user input is never interpreted
/// as a pattern.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: Option<Regex>,
}

impl NameFilter {
    pub fn new(term: &str) -> AppResult<Self> {
        if term.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::Validation(format!("Unusable search term: {}", e)))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn matches(&self, haystack: &str) -> bool {
        self.pattern
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(haystack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_term_matches_everything() {
        let filter = NameFilter::new("").unwrap();
        assert!(filter.matches("Ada Lovelace"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_case_insensitive_substring() {
        let filter = NameFilter::new("ada lov").unwrap();
        assert!(filter.matches("Ada Lovelace"));
        assert!(!filter.matches("Grace Hopper"));

        let filter = NameFilter::new("ÉMILE").unwrap();
        assert!(filter.matches("Dr émile Roux"));
    }

    #[test]
    fn test_pattern_syntax_is_literal() {
        let filter = NameFilter::new("a.*").unwrap();
        assert!(!filter.matches("Ada Lovelace"));
        assert!(filter.matches("Mr a.* Strange"));

        let filter = NameFilter::new("(a+)+$").unwrap();
        assert!(!filter.matches("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa!"));
    }
}
