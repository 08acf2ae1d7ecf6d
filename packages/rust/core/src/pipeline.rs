//! End-to-end pipeline: token document → lines → records → graph → validated graph.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use curriculum_extract::{Extraction, ExtractionReport, extract_records};
use curriculum_graph::{
    AssemblyStats, Relation, TaxonomyGraph, ValidationReport, assemble, prune_noise,
};
use curriculum_layout::{NoiseClassifier, reconstruct_document};
use curriculum_shared::{AppConfig, CurriculumError, Record, Result, TokenDocument};

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The validated taxonomy graph.
    pub graph: TaxonomyGraph,
    /// Records produced by the extractor, in emission order.
    pub records: Vec<Record>,
    /// Extraction counters.
    pub extraction: ExtractionReport,
    /// Assembly counters.
    pub assembly: AssemblyStats,
    /// What the validator removed.
    pub validation: ValidationReport,
    /// Source document name, if the token document carried one.
    pub source: Option<String>,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
}

impl PipelineResult {
    /// Number of performance → content match edges in the final graph.
    pub fn match_edges(&self) -> usize {
        self.graph.edges_of(Relation::RelatedMatch).count()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a page's lines are reconstructed.
    fn page_reconstructed(&self, number: usize, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &PipelineResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_reconstructed(&self, _number: usize, _current: usize, _total: usize) {}
    fn done(&self, _result: &PipelineResult) {}
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Read a token document written by the layout-extraction step.
///
/// Tokens with blank text are dropped; pages without a number are numbered
/// by position. A document without pages is an input error; a page number
/// listed twice is a validation error.
pub fn load_token_document(path: &Path) -> Result<TokenDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| CurriculumError::io(path, e))?;
    let mut doc: TokenDocument = serde_json::from_str(&content).map_err(|e| {
        CurriculumError::parse(format!(
            "failed to parse token document {}: {e}",
            path.display()
        ))
    })?;

    if doc.pages.is_empty() {
        return Err(CurriculumError::input(format!(
            "token document {} contains no pages",
            path.display()
        )));
    }

    let mut seen = HashSet::new();
    for (i, page) in doc.pages.iter_mut().enumerate() {
        if page.number == 0 {
            page.number = i + 1;
        }
        if !seen.insert(page.number) {
            return Err(CurriculumError::validation(format!(
                "token document {} lists page {} twice",
                path.display(),
                page.number
            )));
        }
        page.tokens.retain(|t| !t.text.trim().is_empty());
    }

    if doc.source.is_none() {
        doc.source = path.file_name().map(|n| n.to_string_lossy().into_owned());
    }

    debug!(path = %path.display(), pages = doc.pages.len(), "token document loaded");
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Line reconstruction and record extraction only. Used for column-split
/// calibration, where the graph is not needed.
#[instrument(skip_all, fields(pages = doc.pages.len()))]
pub fn extract_only(
    doc: &TokenDocument,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<Extraction> {
    config.validate()?;
    let noise = NoiseClassifier::new(&config.noise)?;

    progress.phase("Reconstructing lines");
    let total = doc.pages.len();
    let pages = reconstruct_document(doc, &config.layout, |page, position| {
        progress.page_reconstructed(page.number, position, total);
    });

    progress.phase("Extracting records");
    extract_records(&pages, &config.extraction, &noise)
}

/// Run the full pipeline.
///
/// 1. Validate configuration
/// 2. Reconstruct left/right line pairs per page
/// 3. Extract (theme, grade) records
/// 4. Assemble the taxonomy graph
/// 5. Prune noise and dangling cross-references
///
/// Either the whole run succeeds and returns a complete graph, or it fails
/// before assembly.
#[instrument(skip_all, fields(source = doc.source.as_deref().unwrap_or("-"), pages = doc.pages.len()))]
pub fn run_pipeline(
    doc: &TokenDocument,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<PipelineResult> {
    let start = Instant::now();
    info!("starting curriculum pipeline");

    let Extraction {
        records,
        report: extraction,
    } = extract_only(doc, config, progress)?;

    progress.phase("Assembling graph");
    let assembly = assemble(&records, &config.taxonomy);
    let mut graph = assembly.graph;

    progress.phase("Validating graph");
    let noise = NoiseClassifier::new(&config.noise)?;
    let validation = prune_noise(&mut graph, &noise);

    let result = PipelineResult {
        graph,
        records,
        extraction,
        assembly: assembly.stats,
        validation,
        source: doc.source.clone(),
        elapsed: start.elapsed(),
        completed_at: Utc::now(),
    };

    info!(
        records = result.records.len(),
        nodes = result.graph.node_count(),
        edges = result.graph.edge_count(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "pipeline complete"
    );

    progress.done(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curriculum_graph::NodeKind;
    use std::sync::Mutex;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/json")
            .join(name)
    }

    fn fixture_doc() -> TokenDocument {
        load_token_document(&fixture_path("tokens.fixture.json")).expect("load fixture")
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        pages: Mutex<usize>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn page_reconstructed(&self, _number: usize, _current: usize, _total: usize) {
            *self.pages.lock().unwrap() += 1;
        }
        fn done(&self, _result: &PipelineResult) {
            self.phases.lock().unwrap().push("done".into());
        }
    }

    #[test]
    fn fixture_loads_and_drops_blank_tokens() {
        let doc = fixture_doc();
        assert_eq!(doc.source.as_deref(), Some("svp-matematika-nsv-excerpt.pdf"));
        assert_eq!(doc.pages.len(), 3);
        assert!(doc.pages.iter().flat_map(|p| &p.tokens).all(|t| !t.text.trim().is_empty()));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../target");
        std::fs::create_dir_all(&dir).expect("create target dir");

        let cases = [
            ("curriculum-bad-json.json", "{ \"pages\": [", "parse error"),
            ("curriculum-no-pages.json", "{ \"pages\": [] }", "input error"),
            (
                "curriculum-dup-pages.json",
                "{ \"pages\": [ { \"number\": 2 }, { \"number\": 2 } ] }",
                "validation error",
            ),
        ];
        for (name, body, prefix) in cases {
            let path = dir.join(name);
            std::fs::write(&path, body).expect("write");
            let err = load_token_document(&path).unwrap_err();
            assert!(err.to_string().starts_with(prefix), "{name}: {err}");
            let _ = std::fs::remove_file(&path);
        }
    }

    #[test]
    fn missing_document_is_io_error() {
        let err = load_token_document(&fixture_path("does-not-exist.json")).unwrap_err();
        assert!(matches!(err, CurriculumError::Io { .. }));
    }

    #[test]
    fn fixture_extraction_matches_layout() {
        let doc = fixture_doc();
        let extraction =
            extract_only(&doc, &AppConfig::default(), &SilentProgress).expect("extract");

        assert_eq!(extraction.records.len(), 2);
        let first = &extraction.records[0];
        assert_eq!(first.theme, "Geometria a meranie");
        assert_eq!(first.grade, 6);
        assert_eq!(
            first.performance,
            vec!["vypočíta obsah štvorca".to_string(), "porovná obsahy útvarov.".to_string()]
        );
        assert_eq!(
            first.content,
            vec!["štvorec".to_string(), "obsah štvorca".to_string()]
        );

        let second = &extraction.records[1];
        assert_eq!(second.theme, "Kruh, kružnica");
        assert_eq!(second.grade, 8);
        assert_eq!(second.performance, vec!["narysuje kružnicu".to_string()]);
        assert_eq!(second.content, vec!["kružnica".to_string(), "kruh".to_string()]);

        let report = &extraction.report;
        assert_eq!(report.pages, 3);
        assert_eq!(report.noise_dropped, 2);
        assert_eq!(report.ignored_lines, 1);
        assert_eq!(report.theme_headings, 2);
    }

    #[test]
    fn fixture_pipeline_builds_validated_graph() {
        let doc = fixture_doc();
        let progress = RecordingProgress::default();
        let result = run_pipeline(&doc, &AppConfig::default(), &progress).expect("pipeline");

        let kinds = result.graph.kind_counts();
        assert_eq!(kinds[&NodeKind::ConceptScheme], 3);
        assert_eq!(kinds[&NodeKind::Grade], 5);
        assert_eq!(kinds[&NodeKind::Theme], 2);
        assert_eq!(kinds[&NodeKind::PerformanceStatement], 3);
        assert_eq!(kinds[&NodeKind::ContentStatement], 4);
        assert_eq!(kinds[&NodeKind::LearningOpportunity], 2);
        assert_eq!(kinds[&NodeKind::LearningAchievementSpecification], 2);
        assert_eq!(result.match_edges(), 6);
        assert_eq!(result.validation, ValidationReport::default());

        assert_eq!(*progress.pages.lock().unwrap(), 3);
        let phases = progress.phases.lock().unwrap();
        assert_eq!(phases.first().map(String::as_str), Some("Reconstructing lines"));
        assert_eq!(phases.last().map(String::as_str), Some("done"));
    }

    #[test]
    fn narrow_column_split_changes_classification() {
        let doc = fixture_doc();
        let mut config = AppConfig::default();
        config.layout.column_split = 1000;
        let extraction = extract_only(&doc, &config, &SilentProgress).expect("extract");
        assert!(extraction.records.iter().all(|r| r.content.is_empty()));
    }

    #[test]
    fn invalid_config_fails_before_assembly() {
        let doc = fixture_doc();
        let mut config = AppConfig::default();
        config.taxonomy.grade_min = 10;
        let err = run_pipeline(&doc, &config, &SilentProgress).unwrap_err();
        assert!(matches!(err, CurriculumError::Config { .. }));
    }
}
