//! Compiled line markers: theme headings, grade announcements, bullets and
//! column headers.

use regex::Regex;

use curriculum_shared::text::{clean_statement, match_key};
use curriculum_shared::{CurriculumError, ExtractionConfig, Result};

/// A configured theme label with its precomputed match key.
#[derive(Debug, Clone)]
struct ThemeLabel {
    key: String,
    label: String,
}

/// Result of inspecting a left-column cell for a bullet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Bullet {
    /// No bullet glyph at the start of the cell.
    Absent,
    /// A bullet glyph with nothing after it; the text follows on the next line.
    Bare,
    /// A bullet glyph followed by statement text.
    Text(String),
}

/// Immutable matchers built once from [`ExtractionConfig`].
#[derive(Debug, Clone)]
pub(crate) struct Markers {
    themes: Vec<ThemeLabel>,
    grade_marker: Regex,
    bullet: String,
    column_headers: Vec<String>,
}

impl Markers {
    pub(crate) fn new(config: &ExtractionConfig) -> Result<Self> {
        let themes = config
            .themes
            .iter()
            .map(|label| ThemeLabel {
                key: match_key(label),
                label: label.trim().to_string(),
            })
            .filter(|t| !t.key.is_empty())
            .collect::<Vec<_>>();

        if themes.is_empty() {
            return Err(CurriculumError::config("no usable theme labels configured"));
        }

        let grade_marker = Regex::new(&config.grade_marker).map_err(|e| {
            CurriculumError::config(format!("invalid grade marker pattern: {e}"))
        })?;

        Ok(Self {
            themes,
            grade_marker,
            bullet: config.bullet_marker.trim().to_string(),
            column_headers: config.column_headers.iter().map(|h| match_key(h)).collect(),
        })
    }

    /// The configured theme whose label prefixes `line`.
    ///
    /// When several labels match, the longest wins regardless of list order.
    /// A label that extends another one ("Počtové výkony s prirodzenými
    /// číslami, deliteľnosť" over its shorter prefix) would otherwise never
    /// be reported.
    pub(crate) fn match_theme(&self, line: &str) -> Option<&str> {
        let key = match_key(line);
        let mut best: Option<&ThemeLabel> = None;
        for theme in &self.themes {
            if key.starts_with(&theme.key) && best.is_none_or(|b| theme.key.len() > b.key.len()) {
                best = Some(theme);
            }
        }
        best.map(|t| t.label.as_str())
    }

    /// Grade number announced by `line`, if it carries the grade marker.
    pub(crate) fn match_grade(&self, line: &str) -> Option<u32> {
        self.grade_marker
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// True when the cell is (or contains) a column header label.
    pub(crate) fn is_column_header(&self, cell: &str) -> bool {
        let key = match_key(cell);
        self.column_headers.iter().any(|h| !h.is_empty() && key.contains(h.as_str()))
    }

    /// Classify a left-column cell.
    pub(crate) fn bullet(&self, cell: &str) -> Bullet {
        match cell.trim_start().strip_prefix(self.bullet.as_str()) {
            Some(rest) => {
                let text = clean_statement(&rest.replace(self.bullet.as_str(), " "));
                if text.is_empty() {
                    Bullet::Bare
                } else {
                    Bullet::Text(text)
                }
            }
            None => Bullet::Absent,
        }
    }
}
