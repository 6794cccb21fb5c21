//! Row filtering.
//!
//! Filtering is fuzzy and case-insensitive; a row is kept when any of its
//! searchable fields matches the pattern.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

pub struct Matcher {
    inner: SkimMatcherV2,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self {
            inner: SkimMatcherV2::default(),
        }
    }

    /// An empty pattern matches everything.
    pub fn matches(&self, text: &str, pattern: &str) -> bool {
        if pattern.is_empty() {
            return true;
        }
        self.inner
            .fuzzy_match(text, &pattern.to_lowercase())
            .is_some()
    }

    pub fn matches_any<'a>(&self, texts: impl IntoIterator<Item = &'a str>, pattern: &str) -> bool {
        pattern.is_empty() || texts.into_iter().any(|text| self.matches(text, pattern))
    }

    /// Indices of the items whose fields match, in their original order.
    pub fn filter_indices<T>(
        &self,
        items: &[T],
        pattern: &str,
        fields: impl Fn(&T) -> Vec<&str>,
    ) -> Vec<usize> {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.matches_any(fields(item), pattern))
            .map(|(i, _)| i)
            .collect()
    }
}
