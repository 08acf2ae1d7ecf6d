//! Pipeline orchestration for the curriculum graph builder.
//!
//! This crate ties together line reconstruction, record extraction, graph
//! assembly and validation into end-to-end workflows ([`run_pipeline`],
//! [`extract_only`]).

pub mod pipeline;
pub mod report;

pub use pipeline::{
    PipelineResult, ProgressReporter, SilentProgress, extract_only, load_token_document,
    run_pipeline,
};
pub use report::{CalibrationReport, RecordSummary};
