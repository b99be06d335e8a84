//! Bayesian evidence (`background_evidenceInformation.txt`).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::UncertainValue;
use crate::error::{PipelineError, Result};
use crate::io::layout::RunLayout;
use crate::io::table::read_table;
use crate::results::cached;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Natural log of the marginal likelihood.
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub log_evidence: f64,
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub log_evidence_error: f64,
    /// Information gain (nats) from prior to posterior.
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub information_gain: f64,
}

impl Evidence {
    /// Build from exactly three values, in file order.
    pub fn from_values(values: &[f64], origin: &Path) -> Result<Self> {
        match *values {
            [log_evidence, log_evidence_error, information_gain] => Ok(Self {
                log_evidence,
                log_evidence_error,
                information_gain,
            }),
            _ => Err(PipelineError::value(format!(
                "{}: expected 3 evidence values, found {}.",
                origin.display(),
                values.len()
            ))),
        }
    }

    pub fn uncertain(&self) -> UncertainValue {
        UncertainValue {
            value: self.log_evidence,
            error: self.log_evidence_error,
        }
    }
}

#[derive(Debug)]
pub struct EvidenceReader {
    path: PathBuf,
    cache: OnceLock<Evidence>,
}

impl EvidenceReader {
    pub fn new(run: &RunLayout) -> Self {
        Self {
            path: run.evidence_file(),
            cache: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file may hold its three values on one row or one per row.
    pub fn get(&self) -> Result<&Evidence> {
        cached(&self.cache, || {
            debug!(path = %self.path.display(), "reading evidence");
            let values: Vec<f64> = read_table(&self.path)?.into_iter().flatten().collect();
            Evidence::from_values(&values, &self.path)
        })
    }

    pub fn uncertain(&self) -> Result<UncertainValue> {
        Ok(self.get()?.uncertain())
    }
}
