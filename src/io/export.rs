//! Read/write star analysis JSON files.
//!
//! The JSON is the portable record of a finished star:
//! - run reports with per-attempt history
//! - summary statistics, evidence and priors per variant
//! - reconstructed background curves
//! - the Bayes-factor comparison
//!
//! The schema is defined by `app::pipeline::StarAnalysis`. Statistics the
//! sampler reports as NaN or infinite are written as `null` and read back as
//! NaN (see [`non_finite_as_null`]).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::app::pipeline::StarAnalysis;
use crate::error::{PipelineError, Result};

/// Write an analysis JSON file.
pub fn write_analysis_json(path: &Path, analysis: &StarAnalysis) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, analysis)
        .map_err(|e| PipelineError::Export(format!("Failed to write '{}': {e}", path.display())))?;
    out.flush().map_err(|e| PipelineError::io(path, e))
}

/// Read an analysis JSON file.
pub fn read_analysis_json(path: &Path) -> Result<StarAnalysis> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| PipelineError::Export(format!("Invalid analysis JSON '{}': {e}", path.display())))
}

/// Serde adapter for `f64` fields that may hold NaN or infinity.
///
/// JSON has no such numbers: they are written as `null`, and `null` reads
/// back as NaN.
pub mod non_finite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
