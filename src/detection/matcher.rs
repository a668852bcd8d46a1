// Deterministic text layers: literal matching and violent-context scoring.
//
// Both operate on lowercased text with plain substring containment. No
// stemming or tokenization, so "eliminad" in a pattern covers
// eliminados/eliminadas.

use super::config::DetectionConfig;

/// Scans text for configured danger patterns and keywords.
pub struct KeywordMatcher<'a> {
    config: &'a DetectionConfig,
}

impl<'a> KeywordMatcher<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// First configured danger pattern contained in `text`.
    pub fn find_pattern(&self, text: &str) -> Option<&'a str> {
        first_contained(&self.config.danger_patterns, text)
    }

    /// First configured keyword contained in `text`.
    pub fn find_keyword(&self, text: &str) -> Option<&'a str> {
        first_contained(&self.config.keywords, text)
    }
}

fn first_contained<'a>(entries: &'a [String], text: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|entry| text.contains(entry.as_str()))
        .map(String::as_str)
}

/// Counts co-occurring violent vocabulary.
///
/// A single violent word is common in neutral writing such as news; two or
/// more distinct ones together corroborate a keyword hit.
pub struct ContextScorer<'a> {
    config: &'a DetectionConfig,
}

impl<'a> ContextScorer<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Number of distinct violent-context tokens present in `text`.
    pub fn distinct_hits(&self, text: &str) -> usize {
        self.config
            .violent_context
            .iter()
            .filter(|word| text.contains(word.as_str()))
            .count()
    }

    pub fn has_violent_context(&self, text: &str) -> bool {
        self.distinct_hits(text) >= self.config.violent_context_min
    }
}
