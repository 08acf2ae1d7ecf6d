//! Calibration report: per-record statement counts for checking the column
//! split and noise patterns against a real document.

use std::fmt::Write;

use serde::Serialize;

use curriculum_extract::{Extraction, ExtractionReport};
use curriculum_shared::Result;

/// One row per emitted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub theme: String,
    pub grade: u32,
    pub performance: usize,
    pub content: usize,
}

/// Records plus extraction totals.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub column_split: i64,
    pub records: Vec<RecordSummary>,
    pub totals: ExtractionReport,
}

impl CalibrationReport {
    pub fn new(extraction: &Extraction, source: Option<String>, column_split: i64) -> Self {
        let records = extraction
            .records
            .iter()
            .map(|r| RecordSummary {
                theme: r.theme.clone(),
                grade: r.grade,
                performance: r.performance.len(),
                content: r.content.len(),
            })
            .collect();
        Self {
            source,
            column_split,
            records,
            totals: extraction.report.clone(),
        }
    }

    /// Records with an empty column; a high share usually means the column
    /// split is off.
    pub fn one_sided(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.performance == 0 || r.content == 0)
            .count()
    }

    /// Fixed-width text table followed by totals.
    pub fn render_table(&self) -> Result<String> {
        let width = self
            .records
            .iter()
            .map(|r| r.theme.chars().count())
            .max()
            .unwrap_or(0)
            .max("Theme".len());

        let mut out = String::new();
        writeln!(out, "{:<width$}  Grade  Perf  Content", "Theme")?;
        writeln!(out, "{}", "-".repeat(width + 22))?;
        for r in &self.records {
            let pad = width - r.theme.chars().count();
            writeln!(
                out,
                "{}{}  {:>5}  {:>4}  {:>7}",
                r.theme,
                " ".repeat(pad),
                r.grade,
                r.performance,
                r.content
            )?;
        }

        let t = &self.totals;
        writeln!(out)?;
        writeln!(out, "  Column split:    {}", self.column_split)?;
        writeln!(out, "  Pages:           {}", t.pages)?;
        writeln!(out, "  Lines:           {}", t.lines)?;
        writeln!(out, "  Ignored lines:   {}", t.ignored_lines)?;
        writeln!(out, "  Noise dropped:   {}", t.noise_dropped)?;
        writeln!(out, "  Empty segments:  {}", t.empty_segments)?;
        writeln!(out, "  Records:         {}", t.records)?;
        writeln!(out, "  One-sided:       {}", self.one_sided())?;
        Ok(out)
    }
}
