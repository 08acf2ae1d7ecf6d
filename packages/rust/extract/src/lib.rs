//! Record extraction from reconstructed line pairs.
//!
//! A sequential state machine tracks the current theme and grade and buckets
//! left-column bullets (performance standards) and right-column lines
//! (content standards) into one [`Record`] per detected (theme, grade)
//! segment. Theme headings take priority over every other rule, so a heading
//! in the middle of a page always closes the previous segment.
//!
//! The extractor is strictly ordered: context carries across page
//! boundaries, so lines must be fed in document order.

mod markers;

use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use curriculum_layout::{NoiseClassifier, PageLines};
use curriculum_shared::text::clean_statement;
use curriculum_shared::{ExtractionConfig, LinePair, Record, Result};

use crate::markers::{Bullet, Markers};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where the extractor is in the theme/grade structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// No theme heading seen yet.
    #[default]
    Idle,
    /// A theme heading was seen; waiting for its grade marker.
    ThemeActive { theme: String },
    /// Theme and grade known; statements are being collected.
    Collecting { theme: String, grade: u32 },
}

/// Whether the next left-column line continues a bare bullet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulletState {
    #[default]
    Ready,
    /// A bullet glyph arrived without text; the next left-column text
    /// completes it.
    PendingContinuation,
}

/// Counters describing one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Pages fed to the extractor.
    pub pages: usize,
    /// Line pairs fed to the extractor.
    pub lines: usize,
    /// Theme headings recognised.
    pub theme_headings: usize,
    /// Grade markers recognised (inside a theme).
    pub grade_markers: usize,
    /// Lines skipped because no theme/grade context was active.
    pub ignored_lines: usize,
    /// Buffered statements removed by the noise classifier.
    pub noise_dropped: usize,
    /// Segments that were entirely noise and produced no record.
    pub empty_segments: usize,
    /// Records emitted.
    pub records: usize,
}

/// Output of a complete extraction run.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub report: ExtractionReport,
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Stateful line consumer producing [`Record`]s.
#[derive(Debug)]
pub struct RecordExtractor {
    markers: Markers,
    noise: NoiseClassifier,
    phase: Phase,
    bullet: BulletState,
    performance: Vec<String>,
    content: Vec<String>,
    records: Vec<Record>,
    report: ExtractionReport,
}

impl RecordExtractor {
    /// Build an extractor from its configuration and noise classifier.
    pub fn new(config: &ExtractionConfig, noise: NoiseClassifier) -> Result<Self> {
        Ok(Self {
            markers: Markers::new(config)?,
            noise,
            phase: Phase::Idle,
            bullet: BulletState::Ready,
            performance: Vec::new(),
            content: Vec::new(),
            records: Vec::new(),
            report: ExtractionReport::default(),
        })
    }

    /// Current theme/grade phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Current bullet continuation state.
    pub fn bullet_state(&self) -> BulletState {
        self.bullet
    }

    /// Feed every line of a page.
    pub fn push_page(&mut self, page: &PageLines) {
        self.report.pages += 1;
        for line in &page.lines {
            self.push_line(line);
        }
    }

    /// Feed one line pair. Rules are evaluated in priority order:
    /// theme heading, grade marker, context gate, statement collection.
    pub fn push_line(&mut self, line: &LinePair) {
        self.report.lines += 1;
        let combined = line.combined();

        if let Some(theme) = self.markers.match_theme(&combined).map(str::to_string) {
            self.flush();
            debug!(%theme, "theme heading");
            self.report.theme_headings += 1;
            self.phase = Phase::ThemeActive { theme };
            self.bullet = BulletState::Ready;
            return;
        }

        if let Some(grade) = self.markers.match_grade(&combined) {
            let phase = std::mem::take(&mut self.phase);
            self.phase = match phase {
                Phase::ThemeActive { theme } | Phase::Collecting { theme, .. } => {
                    debug!(%theme, grade, "grade marker");
                    self.report.grade_markers += 1;
                    Phase::Collecting { theme, grade }
                }
                Phase::Idle => {
                    trace!(grade, "grade marker outside any theme, ignored");
                    self.report.ignored_lines += 1;
                    Phase::Idle
                }
            };
            self.bullet = BulletState::Ready;
            return;
        }

        if !matches!(self.phase, Phase::Collecting { .. }) {
            trace!(line = %combined, "no active segment, line ignored");
            self.report.ignored_lines += 1;
            return;
        }

        self.collect_content(&line.right);
        self.collect_performance(&line.left);
    }

    /// Right column: content-standard candidates, deduplicated in the buffer.
    fn collect_content(&mut self, right: &str) {
        if right.trim().is_empty() || self.markers.is_column_header(right) {
            return;
        }
        let statement = clean_statement(right);
        if !statement.is_empty() && !self.content.contains(&statement) {
            trace!(%statement, "content statement");
            self.content.push(statement);
        }
    }

    /// Left column: bullets and the continuation of a bare bullet.
    fn collect_performance(&mut self, left: &str) {
        match self.markers.bullet(left) {
            Bullet::Text(statement) => {
                trace!(%statement, "performance bullet");
                self.performance.push(statement);
                self.bullet = BulletState::Ready;
            }
            Bullet::Bare => {
                self.bullet = BulletState::PendingContinuation;
            }
            Bullet::Absent => {
                let statement = clean_statement(left);
                if self.bullet != BulletState::PendingContinuation || statement.is_empty() {
                    return;
                }
                // Page furniture between a bare bullet and its text.
                if self.noise.is_noise(&statement) {
                    trace!(%statement, "noise skipped while awaiting continuation");
                    self.report.noise_dropped += 1;
                } else {
                    trace!(%statement, "bullet continuation");
                    self.performance.push(statement);
                    self.bullet = BulletState::Ready;
                }
            }
        }
    }

    /// Emit the buffered segment if theme and grade are known and anything
    /// survives noise filtering; always clears the buffers.
    fn flush(&mut self) {
        let performance = std::mem::take(&mut self.performance);
        let content = std::mem::take(&mut self.content);
        self.bullet = BulletState::Ready;

        let Phase::Collecting { theme, grade } = &self.phase else {
            return;
        };
        if performance.is_empty() && content.is_empty() {
            return;
        }

        let (performance, dropped_perf) = self.noise.retain_clean(performance);
        let (content, dropped_content) = self.noise.retain_clean(content);
        self.report.noise_dropped += dropped_perf + dropped_content;

        if performance.is_empty() && content.is_empty() {
            debug!(%theme, grade, "segment contained only noise");
            self.report.empty_segments += 1;
            return;
        }

        debug!(
            %theme,
            grade,
            performance = performance.len(),
            content = content.len(),
            "record emitted"
        );
        self.records.push(Record {
            theme: theme.clone(),
            grade: *grade,
            performance,
            content,
        });
        self.report.records += 1;
    }

    /// Flush the final segment and return everything extracted.
    pub fn finish(mut self) -> Extraction {
        self.flush();
        Extraction {
            records: self.records,
            report: self.report,
        }
    }
}

/// Run the extractor over reconstructed pages in document order.
#[instrument(skip_all, fields(pages = pages.len()))]
pub fn extract_records(
    pages: &[PageLines],
    config: &ExtractionConfig,
    noise: &NoiseClassifier,
) -> Result<Extraction> {
    let mut extractor = RecordExtractor::new(config, noise.clone())?;
    for page in pages {
        extractor.push_page(page);
    }
    let extraction = extractor.finish();

    info!(
        records = extraction.report.records,
        lines = extraction.report.lines,
        ignored = extraction.report.ignored_lines,
        noise_dropped = extraction.report.noise_dropped,
        "extraction complete"
    );

    Ok(extraction)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BULLET: &str = "\u{f0fc}";

    fn extractor() -> RecordExtractor {
        RecordExtractor::new(&ExtractionConfig::default(), NoiseClassifier::default())
            .expect("default extractor")
    }

    fn feed(lines: &[(&str, &str)]) -> Extraction {
        let mut ex = extractor();
        for (left, right) in lines {
            ex.push_line(&LinePair::new(*left, *right));
        }
        ex.finish()
    }

    #[test]
    fn canonical_segment_yields_one_record_for_every_theme() {
        let config = ExtractionConfig::default();
        for theme in &config.themes {
            for grade in 5..=9 {
                let marker = format!("Žiak na konci {grade}. ročníka vie/dokáže:");
                let bullet = format!("{BULLET} vypočíta obsah štvorca,");
                let out = feed(&[
                    (theme.as_str(), ""),
                    (marker.as_str(), ""),
                    (bullet.as_str(), "štvorec,"),
                    ("", "obsah štvorca"),
                ]);
                assert_eq!(out.records.len(), 1, "theme {theme} grade {grade}");
                let record = &out.records[0];
                assert_eq!(&record.theme, theme);
                assert_eq!(record.grade, grade);
                assert_eq!(record.performance, vec!["vypočíta obsah štvorca".to_string()]);
                assert_eq!(
                    record.content,
                    vec!["štvorec".to_string(), "obsah štvorca".to_string()]
                );
            }
        }
    }

    #[test]
    fn lines_before_any_theme_are_ignored() {
        let out = feed(&[
            ("Úvod", "Obsahový štandard"),
            (format!("{BULLET} niečo").as_str(), "niečo"),
        ]);
        assert!(out.records.is_empty());
        assert_eq!(out.report.ignored_lines, 2);
    }

    #[test]
    fn content_before_grade_marker_is_ignored() {
        let out = feed(&[
            ("Hranol", ""),
            (format!("{BULLET} ignored").as_str(), "ignored"),
            ("Žiak na konci 8. ročníka vie/dokáže:", ""),
            (format!("{BULLET} kept").as_str(), "kept"),
        ]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].performance, vec!["kept".to_string()]);
        assert_eq!(out.records[0].content, vec!["kept".to_string()]);
    }

    #[test]
    fn new_theme_flushes_previous_segment() {
        let out = feed(&[
            ("Kruh, kružnica", ""),
            ("Žiak na konci 8. ročníka", ""),
            ("", "kružnica"),
            ("Hranol", ""),
            ("Žiak na konci 8. ročníka", ""),
            ("", "podstava hranola"),
        ]);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].theme, "Kruh, kružnica");
        assert_eq!(out.records[0].content, vec!["kružnica".to_string()]);
        assert_eq!(out.records[1].theme, "Hranol");
        assert_eq!(out.records[1].content, vec!["podstava hranola".to_string()]);
    }

    #[test]
    fn theme_heading_resets_grade() {
        let mut ex = extractor();
        ex.push_line(&LinePair::new("Hranol", ""));
        ex.push_line(&LinePair::new("Žiak na konci 8. ročníka", ""));
        assert_eq!(
            ex.phase(),
            &Phase::Collecting { theme: "Hranol".into(), grade: 8 }
        );
        ex.push_line(&LinePair::new("Pytagorova veta", ""));
        assert_eq!(ex.phase(), &Phase::ThemeActive { theme: "Pytagorova veta".into() });
    }

    #[test]
    fn bare_bullet_continues_on_next_left_line() {
        let mut ex = extractor();
        ex.push_line(&LinePair::new("Štatistika", ""));
        ex.push_line(&LinePair::new("Žiak na konci 9. ročníka", ""));
        ex.push_line(&LinePair::new(BULLET, ""));
        assert_eq!(ex.bullet_state(), BulletState::PendingContinuation);
        ex.push_line(&LinePair::new("", "aritmetický priemer"));
        assert_eq!(ex.bullet_state(), BulletState::PendingContinuation);
        ex.push_line(&LinePair::new("vypočíta aritmetický priemer,", ""));
        assert_eq!(ex.bullet_state(), BulletState::Ready);
        ex.push_line(&LinePair::new("text bez odrážky", ""));

        let out = ex.finish();
        assert_eq!(
            out.records[0].performance,
            vec!["vypočíta aritmetický priemer".to_string()]
        );
        assert_eq!(out.records[0].content, vec!["aritmetický priemer".to_string()]);
    }

    #[test]
    fn page_furniture_does_not_consume_bullet_continuation() {
        let mut ex = extractor();
        ex.push_line(&LinePair::new("Hranol", ""));
        ex.push_line(&LinePair::new("Žiak na konci 8. ročníka", ""));
        ex.push_line(&LinePair::new(BULLET, "podstava"));
        ex.push_line(&LinePair::new("© Štátny pedagogický ústav", ""));
        assert_eq!(ex.bullet_state(), BulletState::PendingContinuation);
        ex.push_line(&LinePair::new("24", ""));
        assert_eq!(ex.bullet_state(), BulletState::PendingContinuation);
        ex.push_line(&LinePair::new("vypočíta objem hranola.", "objem"));
        assert_eq!(ex.bullet_state(), BulletState::Ready);

        let out = ex.finish();
        assert_eq!(out.records.len(), 1);
        assert_eq!(
            out.records[0].performance,
            vec!["vypočíta objem hranola.".to_string()]
        );
        assert_eq!(
            out.records[0].content,
            vec!["podstava".to_string(), "objem".to_string()]
        );
        assert_eq!(out.report.noise_dropped, 2);
    }

    #[test]
    fn column_headers_and_duplicates_are_not_content() {
        let out = feed(&[
            ("Hranol", ""),
            ("Žiak na konci 8. ročníka", ""),
            ("Výkonový štandard", "Obsahový štandard"),
            ("", "podstava"),
            ("", "podstava,"),
        ]);
        assert_eq!(out.records[0].content, vec!["podstava".to_string()]);
        assert!(out.records[0].performance.is_empty());
    }

    #[test]
    fn noise_is_filtered_at_flush() {
        let out = feed(&[
            ("Hranol", ""),
            ("Žiak na konci 8. ročníka", ""),
            ("", "24"),
            (format!("{BULLET} Štátny pedagogický ústav").as_str(), "podstava hranola"),
        ]);
        assert_eq!(out.records[0].content, vec!["podstava hranola".to_string()]);
        assert!(out.records[0].performance.is_empty());
        assert_eq!(out.report.noise_dropped, 2);
    }

    #[test]
    fn all_noise_segment_emits_nothing() {
        let out = feed(&[
            ("Hranol", ""),
            ("Žiak na konci 8. ročníka", ""),
            ("", "31"),
            ("", "© 2014"),
        ]);
        assert!(out.records.is_empty());
        assert_eq!(out.report.empty_segments, 1);
    }

    #[test]
    fn theme_without_grade_emits_nothing() {
        let out = feed(&[("Hranol", ""), ("", "podstava"), ("Kruh, kružnica", "")]);
        assert!(out.records.is_empty());
        assert_eq!(out.report.theme_headings, 2);
    }

    #[test]
    fn repeated_segments_are_not_merged() {
        let out = feed(&[
            ("Hranol", ""),
            ("Žiak na konci 8. ročníka", ""),
            ("", "a"),
            ("Hranol", ""),
            ("Žiak na konci 8. ročníka", ""),
            ("", "b"),
        ]);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].theme, out.records[1].theme);
    }

    #[test]
    fn context_spans_page_boundaries() {
        let config = ExtractionConfig::default();
        let noise = NoiseClassifier::default();
        let pages = vec![
            PageLines {
                number: 1,
                lines: vec![
                    LinePair::new("Pytagorova veta", ""),
                    LinePair::new("Žiak na konci 8. ročníka", ""),
                    LinePair::new(BULLET, "pravouhlý trojuholník"),
                ],
            },
            PageLines {
                number: 2,
                lines: vec![
                    LinePair::new("", "12"),
                    LinePair::new("použije Pytagorovu vetu.", "prepona"),
                ],
            },
        ];
        let out = extract_records(&pages, &config, &noise).expect("extract");
        assert_eq!(out.report.pages, 2);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].performance, vec!["použije Pytagorovu vetu.".to_string()]);
        assert_eq!(
            out.records[0].content,
            vec!["pravouhlý trojuholník".to_string(), "prepona".to_string()]
        );
    }
}
