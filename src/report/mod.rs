//! Reporting utilities: formatted terminal output for star analyses.

pub mod format;

pub use format::*;
