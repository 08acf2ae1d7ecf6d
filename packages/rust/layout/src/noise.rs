//! Page-furniture detection: page numbers, running headers/footers and
//! copyright lines.
//!
//! The classifier is a pure predicate. It is applied while records are
//! extracted and again to the labels of the assembled graph.

use regex::{Regex, RegexBuilder};

use curriculum_shared::{CurriculumError, NoiseConfig, Result};

/// Case-insensitive matcher over a fixed set of noise patterns.
#[derive(Debug, Clone)]
pub struct NoiseClassifier {
    patterns: Vec<Regex>,
}

impl NoiseClassifier {
    /// Compile the configured patterns.
    pub fn new(config: &NoiseConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| CurriculumError::config(format!("invalid noise pattern '{p}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// True when the trimmed text matches any noise pattern.
    pub fn is_noise(&self, text: &str) -> bool {
        let trimmed = text.trim();
        self.patterns.iter().any(|p| p.is_match(trimmed))
    }

    /// Drop noise entries, returning the survivors and how many were dropped.
    pub fn retain_clean(&self, items: Vec<String>) -> (Vec<String>, usize) {
        let before = items.len();
        let kept: Vec<String> = items.into_iter().filter(|s| !self.is_noise(s)).collect();
        let dropped = before - kept.len();
        (kept, dropped)
    }
}

impl Default for NoiseClassifier {
    fn default() -> Self {
        Self::new(&NoiseConfig::default()).expect("default noise patterns")
    }
}
