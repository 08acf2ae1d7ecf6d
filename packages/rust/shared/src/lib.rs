//! Shared types, error model, configuration and text helpers.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`CurriculumError`] — the unified error type
//! - Domain types ([`PositionedToken`], [`Page`], [`LinePair`], [`Record`])
//! - Configuration ([`AppConfig`] and its per-stage sections, config loading)
//! - Label normalization and slugging ([`text`])

pub mod config;
pub mod error;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ExtractionConfig, LayoutConfig, NamespaceConfig, NoiseConfig, TaxonomyConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CurriculumError, Result};
pub use types::{LinePair, Page, PositionedToken, Record, TokenDocument};
