//! Core domain types shared by every pipeline stage.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Positioned input
// ---------------------------------------------------------------------------

/// A word-level token as produced by the layout-extraction collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedToken {
    /// The token text.
    pub text: String,
    /// Left edge of the token's bounding box.
    pub x0: f64,
    /// Top edge of the token's bounding box.
    pub top: f64,
}

impl PositionedToken {
    pub fn new(text: impl Into<String>, x0: f64, top: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
        }
    }
}

/// All tokens of a single page, in no particular order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number within the source document.
    #[serde(default)]
    pub number: usize,
    /// Tokens found on the page.
    #[serde(default)]
    pub tokens: Vec<PositionedToken>,
}

/// The complete positioned-text dump of a source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenDocument {
    /// Name or path of the original document, for traceability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Pages in document order.
    pub pages: Vec<Page>,
}

// ---------------------------------------------------------------------------
// Reconstructed lines
// ---------------------------------------------------------------------------

/// One visual line split into its left and right column text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinePair {
    pub left: String,
    pub right: String,
}

impl LinePair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Both columns joined by a single space, trimmed.
    pub fn combined(&self) -> String {
        format!("{} {}", self.left, self.right).trim().to_string()
    }

    /// True when neither column carries text.
    pub fn is_blank(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Extracted records
// ---------------------------------------------------------------------------

/// Statements collected for one (theme, grade) segment of the document.
///
/// Records for the same pair are never merged at extraction time; the graph
/// assembler unions them by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Theme label exactly as configured.
    pub theme: String,
    /// Grade level announced by the grade marker.
    pub grade: u32,
    /// Performance-standard statements (left column bullets).
    #[serde(default)]
    pub performance: Vec<String>,
    /// Content-standard statements (right column lines).
    #[serde(default)]
    pub content: Vec<String>,
}

impl Record {
    pub fn new(theme: impl Into<String>, grade: u32) -> Self {
        Self {
            theme: theme.into(),
            grade,
            performance: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn with_performance(mut self, statement: impl Into<String>) -> Self {
        self.performance.push(statement.into());
        self
    }

    pub fn with_content(mut self, statement: impl Into<String>) -> Self {
        self.content.push(statement.into());
        self
    }
}
