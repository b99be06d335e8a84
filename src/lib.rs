//! `bgfit` library crate.
//!
//! Makes an external nested-sampling engine usable as a dependable unit of
//! work when fitting stellar background models:
//!
//! - writes the sampler's fixed-format inputs (`io`)
//! - launches, supervises and retries one sampler run per model variant (`sampler`)
//! - parses its outputs into typed statistics (`results`)
//! - rebuilds the background curves (`models`) and compares variants (`compare`)
//!
//! `app::analyze_star` ties these together for one star.

pub mod app;
pub mod compare;
pub mod domain;
pub mod error;
pub mod io;
pub mod models;
pub mod report;
pub mod results;
pub mod sampler;

pub use app::{StarAnalysis, VariantAnalysis, analyze_star};
pub use error::{PipelineError, Result};
