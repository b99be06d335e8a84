//! Top-level orchestration for one star.
//!
//! Front-ends (batch scripts, notebooks, a future CLI) call into
//! [`pipeline::analyze_star`]; everything it needs arrives as arguments:
//! - the validated `RunRequest`
//! - an explicit `PipelineConfig`
//! - the process launcher (real or scripted)
//! - a cancellation token

pub mod pipeline;

pub use pipeline::{StarAnalysis, VariantAnalysis, analyze_star};
