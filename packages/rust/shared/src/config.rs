//! Application configuration for the curriculum graph pipeline.
//!
//! User config lives at `~/.curriculum-graph/curriculum-graph.toml`.
//! CLI flags override config file values, which override defaults.
//!
//! Each pipeline stage receives only its own immutable section
//! ([`LayoutConfig`], [`ExtractionConfig`], [`NoiseConfig`],
//! [`TaxonomyConfig`]); nothing reads configuration from ambient state.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CurriculumError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "curriculum-graph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".curriculum-graph";

/// Theme headings of the lower-secondary mathematics curriculum, in
/// document order.
const DEFAULT_THEMES: &[&str] = &[
    "Vytvorenie oboru prirodzených čísel do a nad milión",
    "Počtové výkony s prirodzenými číslami",
    "Geometria a meranie",
    "Súmernosť v rovine (osová a stredová)",
    "Riešenie aplikačných úloh a úloh rozvíjajúcich špecifické matematické myslenie",
    "Počtové výkony s prirodzenými číslami, deliteľnosť",
    "Desatinné čísla, počtové výkony (operácie) s desatinnými číslami",
    "Obsah obdĺžnika, štvorca a pravouhlého trojuholníka v desatinných číslach, jednotky obsahu",
    "Uhol a jeho veľkosť, operácie s uhlami",
    "Trojuholník, zhodnosť trojuholníkov",
    "Kombinatorika v kontextových úlohách",
    "Zlomky, počtové výkony so zlomkami, kladné racionálne čísla",
    "Percentá, promile",
    "Kváder a kocka, ich povrch a objem v desatinných číslach, premieňanie jednotiek objemu",
    "Pomer, priama a nepriama úmernosť",
    "Kombinatorika",
    "Kladné a záporné čísla, počtové výkony s celými a desatinnými číslami, racionálne čísla",
    "Premenná, výraz",
    "Rovnobežník, lichobežník, obvod a obsah rovnobežníka, lichobežníka a trojuholníka",
    "Kruh, kružnica",
    "Hranol",
    "Pravdepodobnosť, štatistika",
    "Mocniny a odmocniny, zápis veľkých čísel",
    "Pytagorova veta",
    "Ihlan, valec, kužeľ, guľa, ich objem a povrch",
    "Riešenie lineárnych rovníc a nerovníc s jednou neznámou",
    "Podobnosť trojuholníkov",
    "Štatistika",
    "Grafické znázorňovanie závislostí",
];

/// Header/footer fragments repeated on every page of the source document.
const DEFAULT_NOISE_PATTERNS: &[&str] = &[
    r"^\s*\d{1,3}\s*$",
    r"nižšie\s*stredné\s*vzdelanie",
    r"matematika\s*[–-]\s*nižšie\s*stredné\s*vzdelanie",
    r"štátny\s*pedagogický\s*ústav",
    r"pedagogický\s*ústav",
    r"^\s*©",
];

// ---------------------------------------------------------------------------
// Config structs (matching curriculum-graph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Line reconstruction parameters.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Record extraction markers.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Noise patterns.
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Taxonomy vocabulary and identifiers.
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
}

/// `[layout]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal coordinate separating the left and right columns.
    #[serde(default = "default_column_split")]
    pub column_split: i64,

    /// Maximum vertical distance between a token and its line.
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_split: default_column_split(),
            line_tolerance: default_line_tolerance(),
        }
    }
}

fn default_column_split() -> i64 {
    400
}
fn default_line_tolerance() -> f64 {
    2.0
}

/// `[extraction]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Theme labels recognised at the start of a line.
    #[serde(default = "default_themes")]
    pub themes: Vec<String>,

    /// Regex announcing the grade; capture group 1 is the grade number.
    #[serde(default = "default_grade_marker")]
    pub grade_marker: String,

    /// Glyph that starts a performance-standard bullet.
    #[serde(default = "default_bullet_marker")]
    pub bullet_marker: String,

    /// Column header labels that are never statements.
    #[serde(default = "default_column_headers")]
    pub column_headers: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            themes: default_themes(),
            grade_marker: default_grade_marker(),
            bullet_marker: default_bullet_marker(),
            column_headers: default_column_headers(),
        }
    }
}

fn default_themes() -> Vec<String> {
    DEFAULT_THEMES.iter().map(|t| (*t).to_string()).collect()
}
fn default_grade_marker() -> String {
    r"Žiak na konci\s+(\d+)\.\s*ročníka".into()
}
fn default_bullet_marker() -> String {
    "\u{f0fc}".into()
}
fn default_column_headers() -> Vec<String> {
    vec!["Obsahový štandard".into(), "Výkonový štandard".into()]
}

/// `[noise]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Regex patterns; a match anywhere in the text marks it as noise.
    #[serde(default = "default_noise_patterns")]
    pub patterns: Vec<String>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            patterns: default_noise_patterns(),
        }
    }
}

fn default_noise_patterns() -> Vec<String> {
    DEFAULT_NOISE_PATTERNS.iter().map(|p| (*p).to_string()).collect()
}

/// `[taxonomy]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// First grade of the configured range.
    #[serde(default = "default_grade_min")]
    pub grade_min: u32,

    /// Last grade of the configured range (inclusive).
    #[serde(default = "default_grade_max")]
    pub grade_max: u32,

    /// Language tag attached to every label.
    #[serde(default = "default_language")]
    pub language: String,

    /// Subject display name used in opportunity labels.
    #[serde(default = "default_subject_name")]
    pub subject_name: String,

    /// Subject slug used in opportunity identifiers.
    #[serde(default = "default_subject_slug")]
    pub subject_slug: String,

    /// Word following the grade number in labels (`"5. ročník"`).
    #[serde(default = "default_grade_label_suffix")]
    pub grade_label_suffix: String,

    /// Citation attached to every scheme.
    #[serde(default = "default_source_citation")]
    pub source_citation: String,

    /// Label of the main scheme.
    #[serde(default = "default_main_scheme_label")]
    pub main_scheme_label: String,

    /// Label of the performance-standard scheme.
    #[serde(default = "default_performance_scheme_label")]
    pub performance_scheme_label: String,

    /// Label of the content-standard scheme.
    #[serde(default = "default_content_scheme_label")]
    pub content_scheme_label: String,

    /// Identifier bases and external resources.
    #[serde(default)]
    pub namespaces: NamespaceConfig,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            grade_min: default_grade_min(),
            grade_max: default_grade_max(),
            language: default_language(),
            subject_name: default_subject_name(),
            subject_slug: default_subject_slug(),
            grade_label_suffix: default_grade_label_suffix(),
            source_citation: default_source_citation(),
            main_scheme_label: default_main_scheme_label(),
            performance_scheme_label: default_performance_scheme_label(),
            content_scheme_label: default_content_scheme_label(),
            namespaces: NamespaceConfig::default(),
        }
    }
}

impl TaxonomyConfig {
    /// Every grade of the configured range, ascending.
    pub fn grades(&self) -> std::ops::RangeInclusive<u32> {
        self.grade_min..=self.grade_max
    }
}

fn default_grade_min() -> u32 {
    5
}
fn default_grade_max() -> u32 {
    9
}
fn default_language() -> String {
    "sk".into()
}
fn default_subject_name() -> String {
    "Matematika".into()
}
fn default_subject_slug() -> String {
    "matematika".into()
}
fn default_grade_label_suffix() -> String {
    "ročník".into()
}
fn default_source_citation() -> String {
    "Štátny vzdelávací program pre 2. stupeň ZŠ".into()
}
fn default_main_scheme_label() -> String {
    "Matematika – 2. stupeň ZŠ (ISCED 2)".into()
}
fn default_performance_scheme_label() -> String {
    "ŠVP – výkonový štandard – Matematika – 2. stupeň ZŠ".into()
}
fn default_content_scheme_label() -> String {
    "ŠVP – obsahový štandard – Matematika – 2. stupeň ZŠ".into()
}

/// `[taxonomy.namespaces]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Base for theme, grade and scheme identifiers.
    #[serde(default = "default_concept_base")]
    pub concept_base: String,

    /// Base for performance-standard concepts.
    #[serde(default = "default_performance_base")]
    pub performance_base: String,

    /// Base for content-standard concepts.
    #[serde(default = "default_content_base")]
    pub content_base: String,

    /// Base for learning opportunities.
    #[serde(default = "default_opportunity_base")]
    pub opportunity_base: String,

    /// Base for learning achievement specifications.
    #[serde(default = "default_specification_base")]
    pub specification_base: String,

    /// Base of the external study-grade resources.
    #[serde(default = "default_study_grade_base")]
    pub study_grade_base: String,

    /// External subject classification (ISCED-F).
    #[serde(default = "default_subject")]
    pub subject: String,

    /// External education level (ISCED 2011).
    #[serde(default = "default_education_level")]
    pub education_level: String,

    /// Local name of the main scheme under `concept_base`.
    #[serde(default = "default_main_scheme")]
    pub main_scheme: String,

    /// Local name of the performance-standard scheme under `concept_base`.
    #[serde(default = "default_performance_scheme")]
    pub performance_scheme: String,

    /// Local name of the content-standard scheme under `concept_base`.
    #[serde(default = "default_content_scheme")]
    pub content_scheme: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            concept_base: default_concept_base(),
            performance_base: default_performance_base(),
            content_base: default_content_base(),
            opportunity_base: default_opportunity_base(),
            specification_base: default_specification_base(),
            study_grade_base: default_study_grade_base(),
            subject: default_subject(),
            education_level: default_education_level(),
            main_scheme: default_main_scheme(),
            performance_scheme: default_performance_scheme(),
            content_scheme: default_content_scheme(),
        }
    }
}

fn default_concept_base() -> String {
    "http://minedu.sk/def/".into()
}
fn default_performance_base() -> String {
    "http://minedu.sk/def/vykonovy-standard/".into()
}
fn default_content_base() -> String {
    "http://minedu.sk/def/obsahovy-standard/".into()
}
fn default_opportunity_base() -> String {
    "http://minedu.sk/id/learning-opportunity/".into()
}
fn default_specification_base() -> String {
    "http://minedu.sk/id/learning-achievement-specification/".into()
}
fn default_study_grade_base() -> String {
    "https://data.gov.sk/def/study-grade/".into()
}
fn default_subject() -> String {
    "http://data.europa.eu/snb/isced-f/054".into()
}
fn default_education_level() -> String {
    "http://publications.europa.eu/resource/authority/education-level/ISCED_2".into()
}
fn default_main_scheme() -> String {
    "scheme-matematika-2-stupen-zs".into()
}
fn default_performance_scheme() -> String {
    "svp-vykonovy-standard-matematika-2-stupen-zs".into()
}
fn default_content_scheme() -> String {
    "svp-obsahovy-standard-matematika-2-stupen-zs".into()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Check the whole configuration before any pipeline stage runs.
    pub fn validate(&self) -> Result<()> {
        if self.layout.line_tolerance < 0.0 || !self.layout.line_tolerance.is_finite() {
            return Err(CurriculumError::config(format!(
                "layout.line_tolerance must be a non-negative number, got {}",
                self.layout.line_tolerance
            )));
        }

        if self.extraction.themes.iter().all(|t| t.trim().is_empty()) {
            return Err(CurriculumError::config("extraction.themes must not be empty"));
        }
        if self.extraction.bullet_marker.trim().is_empty() {
            return Err(CurriculumError::config(
                "extraction.bullet_marker must not be blank",
            ));
        }

        let marker = Regex::new(&self.extraction.grade_marker).map_err(|e| {
            CurriculumError::config(format!("invalid extraction.grade_marker: {e}"))
        })?;
        if marker.captures_len() < 2 {
            return Err(CurriculumError::config(
                "extraction.grade_marker needs a capture group for the grade number",
            ));
        }

        for pattern in &self.noise.patterns {
            Regex::new(pattern).map_err(|e| {
                CurriculumError::config(format!("invalid noise pattern '{pattern}': {e}"))
            })?;
        }

        let taxonomy = &self.taxonomy;
        if taxonomy.grade_min > taxonomy.grade_max {
            return Err(CurriculumError::config(format!(
                "taxonomy.grade_min ({}) exceeds taxonomy.grade_max ({})",
                taxonomy.grade_min, taxonomy.grade_max
            )));
        }

        let ns = &taxonomy.namespaces;
        for (name, value) in [
            ("concept_base", &ns.concept_base),
            ("performance_base", &ns.performance_base),
            ("content_base", &ns.content_base),
            ("opportunity_base", &ns.opportunity_base),
            ("specification_base", &ns.specification_base),
            ("study_grade_base", &ns.study_grade_base),
            ("subject", &ns.subject),
            ("education_level", &ns.education_level),
        ] {
            let url = Url::parse(value).map_err(|e| {
                CurriculumError::config(format!(
                    "taxonomy.namespaces.{name} is not an absolute URL ('{value}'): {e}"
                ))
            })?;
            // Identifiers are built from the raw string, so it must already be canonical.
            if url.as_str() != value.as_str() {
                return Err(CurriculumError::config(format!(
                    "taxonomy.namespaces.{name} is not in canonical form ('{value}', expected '{url}')"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.curriculum-graph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CurriculumError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.curriculum-graph/curriculum-graph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CurriculumError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CurriculumError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CurriculumError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CurriculumError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CurriculumError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
