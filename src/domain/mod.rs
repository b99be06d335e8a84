//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the validated per-star input (`RunRequest`, `PriorBound`)
//! - model variants and canonical parameter names
//! - run status and the explicit pipeline configuration

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
