//! Typed readers over the sampler's output files.
//!
//! Each reader is bound to one run directory, parses its file on first access
//! and caches the result for the lifetime of the reader. A missing file is an
//! `Io` error; whether that is fatal is the caller's decision (summary and
//! evidence are required for model comparison, traces and marginals only feed
//! diagnostics).

pub mod evidence;
pub mod marginal;
pub mod priors;
pub mod summary;
pub mod trace;

pub use evidence::*;
pub use marginal::*;
pub use priors::*;
pub use summary::*;
pub use trace::*;

use std::sync::OnceLock;

use crate::error::Result;
use crate::io::layout::RunLayout;

/// Return the cached value, loading it on first use.
///
/// Concurrent first calls may both load; only one value is kept.
pub(crate) fn cached<T>(cell: &OnceLock<T>, load: impl FnOnce() -> Result<T>) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = load()?;
    Ok(cell.get_or_init(|| value))
}

/// All readers for one variant's run directory.
#[derive(Debug)]
pub struct VariantResults {
    pub summary: SummaryReader,
    pub evidence: EvidenceReader,
    pub priors: PriorReader,
    pub traces: TraceReader,
    pub marginals: MarginalReader,
}

impl VariantResults {
    pub fn new(run: &RunLayout) -> Self {
        Self {
            summary: SummaryReader::new(run),
            evidence: EvidenceReader::new(run),
            priors: PriorReader::new(run),
            traces: TraceReader::new(run),
            marginals: MarginalReader::new(run),
        }
    }
}
