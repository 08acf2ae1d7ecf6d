//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use curriculum_core::{
    CalibrationReport, PipelineResult, ProgressReporter, extract_only, load_token_document,
    run_pipeline,
};
use curriculum_graph::{NodeKind, Prefixes, write_json, write_turtle};
use curriculum_shared::{AppConfig, config_file_path, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// curriculum-graph: build a SKOS/ELM taxonomy from a curriculum document.
#[derive(Parser)]
#[command(
    name = "curriculum-graph",
    version,
    about = "Turn a positioned-token dump of a curriculum document into a knowledge graph.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Graph output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Turtle,
    Json,
}

/// Configuration source and per-run layout overrides.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct ConfigArgs {
    /// Config file (defaults to ~/.curriculum-graph/curriculum-graph.toml).
    #[arg(long, env = "CURRICULUM_GRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Horizontal coordinate separating the left and right columns.
    #[arg(long)]
    pub column_split: Option<i64>,

    /// Maximum vertical distance between tokens of one line.
    #[arg(long)]
    pub line_tolerance: Option<f64>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the taxonomy graph from a token document.
    Convert {
        /// Token document (JSON) produced by the layout-extraction step.
        input: PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format.
        #[arg(short, long, default_value = "turtle")]
        format: OutputFormat,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print per-record statement counts for column-split calibration.
    Records {
        /// Token document (JSON) produced by the layout-extraction step.
        input: PathBuf,

        /// Emit the report as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "curriculum=info",
        1 => "curriculum=debug",
        _ => "curriculum=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert {
            input,
            out,
            format,
            config,
        } => cmd_convert(&input, out.as_deref(), format, &config),
        Command::Records {
            input,
            json,
            config,
        } => cmd_records(&input, json, &config),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show { config } => cmd_config_show(&config),
        },
    }
}

/// Config file (explicit or default location) with CLI overrides applied.
fn resolve_config(args: &ConfigArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(split) = args.column_split {
        config.layout.column_split = split;
    }
    if let Some(tolerance) = args.line_tolerance {
        config.layout.line_tolerance = tolerance;
    }
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_convert(
    input: &Path,
    out: Option<&Path>,
    format: OutputFormat,
    args: &ConfigArgs,
) -> Result<()> {
    let config = resolve_config(args)?;
    let doc = load_token_document(input)?;

    info!(
        input = %input.display(),
        pages = doc.pages.len(),
        column_split = config.layout.column_split,
        "converting curriculum document"
    );

    let result = with_spinner(|reporter| run_pipeline(&doc, &config, reporter))?;

    let rendered = match format {
        OutputFormat::Turtle => write_turtle(
            &result.graph,
            &Prefixes::new(&config.taxonomy.namespaces.concept_base),
        )?,
        OutputFormat::Json => write_json(&result.graph)?,
    };

    match out {
        Some(path) => {
            std::fs::write(path, &rendered)
                .map_err(|e| eyre!("cannot write '{}': {e}", path.display()))?;
            print_summary(&result, Some(path));
        }
        None => {
            print!("{rendered}");
            print_summary(&result, None);
        }
    }

    Ok(())
}

/// Print the run summary. Goes to stderr when the graph itself went to
/// stdout.
fn print_summary(result: &PipelineResult, out: Option<&Path>) {
    let kinds = result.graph.kind_counts();
    let count = |kind: NodeKind| kinds.get(&kind).copied().unwrap_or_default();
    let mut lines = vec![
        String::new(),
        "  Curriculum graph built successfully!".to_string(),
    ];
    if let Some(source) = &result.source {
        lines.push(format!("  Source:       {source}"));
    }
    lines.extend([
        format!("  Records:      {}", result.records.len()),
        format!("  Themes:       {}", count(NodeKind::Theme)),
        format!("  Grades:       {}", count(NodeKind::Grade)),
        format!(
            "  Performance:  {}",
            count(NodeKind::PerformanceStatement)
        ),
        format!("  Content:      {}", count(NodeKind::ContentStatement)),
        format!(
            "  Segments:     {}",
            count(NodeKind::LearningOpportunity)
        ),
        format!("  Matches:      {}", result.match_edges()),
        format!(
            "  Nodes/edges:  {}/{}",
            result.graph.node_count(),
            result.graph.edge_count()
        ),
        format!(
            "  Pruned:       {} nodes, {} dangling edges",
            result.validation.removed_nodes, result.validation.dangling_edges
        ),
        format!("  Skipped:      {} records", result.assembly.skipped_records),
        format!(
            "  Off-range:    {} records without a grade link",
            result.assembly.out_of_range_grades
        ),
    ]);
    if let Some(path) = out {
        lines.push(format!("  Output:       {}", path.display()));
    }
    lines.push(format!(
        "  Time:         {:.1}s (finished {})",
        result.elapsed.as_secs_f64(),
        result.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(String::new());

    for line in lines {
        if out.is_some() {
            println!("{line}");
        } else {
            eprintln!("{line}");
        }
    }
}

fn cmd_records(input: &Path, json: bool, args: &ConfigArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let doc = load_token_document(input)?;

    info!(input = %input.display(), column_split = config.layout.column_split, "calibrating");

    let extraction = with_spinner(|reporter| extract_only(&doc, &config, reporter))?;

    let report = CalibrationReport::new(&extraction, doc.source.clone(), config.layout.column_split);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_table()?);
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(args: &ConfigArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let source = match &args.config {
        Some(path) => path.clone(),
        None => config_file_path()?,
    };
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", source.display());
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

/// Run `stage` under a spinner that is cleared whether the stage succeeds
/// or fails.
fn with_spinner<T>(
    stage: impl FnOnce(&CliProgress) -> curriculum_shared::Result<T>,
) -> Result<T> {
    let reporter = CliProgress::new()?;
    let outcome = stage(&reporter);
    reporter.finish();
    Ok(outcome?)
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_reconstructed(&self, number: usize, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Reconstructing lines [{current}/{total}] page {number}"));
    }

    fn done(&self, _result: &PipelineResult) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_is_cleared_when_stage_fails() {
        let mut spinner = None;
        let outcome: Result<()> = with_spinner(|reporter| {
            spinner = Some(reporter.spinner.clone());
            Err(curriculum_shared::CurriculumError::input("no pages"))
        });
        assert!(outcome.is_err());
        assert!(spinner.expect("stage ran").is_finished());
    }

    #[test]
    fn parses_convert_with_overrides() {
        let cli = Cli::try_parse_from([
            "curriculum-graph",
            "-v",
            "convert",
            "doc.json",
            "--format",
            "json",
            "--column-split",
            "320",
            "-o",
            "out.json",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Convert {
                input,
                out,
                format,
                config,
            } => {
                assert_eq!(input, PathBuf::from("doc.json"));
                assert_eq!(out, Some(PathBuf::from("out.json")));
                assert!(matches!(format, OutputFormat::Json));
                assert_eq!(config.column_split, Some(320));
                assert!(config.line_tolerance.is_none());
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn parses_records_json() {
        let cli = Cli::try_parse_from(["curriculum-graph", "records", "doc.json", "--json"])
            .expect("parse");
        assert!(matches!(cli.command, Command::Records { json: true, .. }));
    }

    #[test]
    fn overrides_apply_to_explicit_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/curriculum-cli-test-config.toml");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create target dir");
        }
        std::fs::write(&path, "[layout]\ncolumn_split = 250\n").expect("write config");

        let args = ConfigArgs {
            config: Some(path.clone()),
            column_split: None,
            line_tolerance: Some(3.5),
        };
        let config = resolve_config(&args).expect("resolve");
        assert_eq!(config.layout.column_split, 250);
        assert_eq!(config.layout.line_tolerance, 3.5);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/curriculum-cli-test-negative.toml");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create target dir");
        }
        std::fs::write(&path, "").expect("write config");
        let args = ConfigArgs {
            config: Some(path.clone()),
            column_split: None,
            line_tolerance: Some(-1.0),
        };
        assert!(resolve_config(&args).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
