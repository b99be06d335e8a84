//! Parameter summary statistics (`background_parameterSummary.txt`).
//!
//! One row per fitted parameter, seven columns:
//! mean, median, mode, variance, lower credible limit, upper credible limit,
//! skewness.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ModelVariant, ParameterName, UncertainValue};
use crate::error::{PipelineError, Result};
use crate::io::layout::RunLayout;
use crate::io::table::{read_table, require_columns};
use crate::results::cached;

pub const SUMMARY_COLUMNS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub mean: f64,
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub median: f64,
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub mode: f64,
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub variance: f64,
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub lower_credible_limit: f64,
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub upper_credible_limit: f64,
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub skewness: f64,
}

/// Unknown statistics: every field is NaN.
impl Default for SummaryStatistics {
    fn default() -> Self {
        Self {
            mean: f64::NAN,
            median: f64::NAN,
            mode: f64::NAN,
            variance: f64::NAN,
            lower_credible_limit: f64::NAN,
            upper_credible_limit: f64::NAN,
            skewness: f64::NAN,
        }
    }
}

impl SummaryStatistics {
    fn from_row(row: &[f64]) -> Self {
        Self {
            mean: row[0],
            median: row[1],
            mode: row[2],
            variance: row[3],
            lower_credible_limit: row[4],
            upper_credible_limit: row[5],
            skewness: row[6],
        }
    }

    /// `median ± |median − lower credible limit|`.
    pub fn uncertain(&self) -> UncertainValue {
        UncertainValue {
            value: self.median,
            error: (self.median - self.lower_credible_limit).abs(),
        }
    }
}

/// Summary statistics for every parameter of one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    variant: ModelVariant,
    stats: BTreeMap<ParameterName, SummaryStatistics>,
}

impl ParameterSummary {
    /// Build from parsed rows; the row count decides the variant.
    pub fn from_rows(rows: &[Vec<f64>], origin: &Path) -> Result<Self> {
        require_columns(rows, SUMMARY_COLUMNS, origin)?;
        let variant = ModelVariant::from_param_count(rows.len()).ok_or_else(|| {
            PipelineError::value(format!(
                "{}: {} parameter rows, expected 7 or 10.",
                origin.display(),
                rows.len()
            ))
        })?;

        let stats = ParameterName::for_variant(variant)
            .iter()
            .zip(rows)
            .map(|(&name, row)| (name, SummaryStatistics::from_row(row)))
            .collect();
        Ok(Self { variant, stats })
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn get(&self, name: ParameterName) -> Option<&SummaryStatistics> {
        self.stats.get(&name)
    }

    /// Statistics for `name`, or all-NaN statistics when the variant does not
    /// fit that parameter.
    pub fn get_or_default(&self, name: ParameterName) -> SummaryStatistics {
        self.stats.get(&name).copied().unwrap_or_default()
    }

    /// Medians in file order.
    pub fn medians(&self) -> Vec<f64> {
        self.stats.values().map(|s| s.median).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterName, &SummaryStatistics)> {
        self.stats.iter().map(|(k, v)| (*k, v))
    }
}

#[derive(Debug)]
pub struct SummaryReader {
    path: PathBuf,
    variant: ModelVariant,
    cache: OnceLock<ParameterSummary>,
}

impl SummaryReader {
    pub fn new(run: &RunLayout) -> Self {
        Self {
            path: run.summary_file(),
            variant: run.variant(),
            cache: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<&ParameterSummary> {
        cached(&self.cache, || {
            debug!(path = %self.path.display(), "reading parameter summary");
            let rows = read_table(&self.path)?;
            let summary = ParameterSummary::from_rows(&rows, &self.path)?;
            if summary.variant() != self.variant {
                return Err(PipelineError::value(format!(
                    "{}: {} parameters found, {} expects {}.",
                    self.path.display(),
                    summary.len(),
                    self.variant,
                    self.variant.param_count()
                )));
            }
            Ok(summary)
        })
    }

    pub fn parameter(&self, name: ParameterName) -> Result<SummaryStatistics> {
        Ok(self.get()?.get_or_default(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::layout::StarLayout;
    use crate::io::table::write_table;

    fn rows(n: usize) -> Vec<[f64; 7]> {
        (0..n)
            .map(|i| {
                let m = 10.0 + i as f64;
                [m + 0.1, m, m - 0.1, 0.25, m - 0.5, m + 0.7, 0.0]
            })
            .collect()
    }

    fn run_with(variant: ModelVariant, n: usize) -> (tempfile::TempDir, RunLayout) {
        let tmp = tempfile::tempdir().unwrap();
        let run = StarLayout::new("KIC3", tmp.path()).run(variant);
        std::fs::create_dir_all(run.dir()).unwrap();
        write_table(&run.summary_file(), rows(n)).unwrap();
        (tmp, run)
    }

    #[test]
    fn full_summary_has_ten_named_parameters() {
        let (_tmp, run) = run_with(ModelVariant::Full, 10);
        let reader = SummaryReader::new(&run);
        let summary = reader.get().unwrap();

        assert_eq!(summary.len(), 10);
        assert_eq!(summary.get(ParameterName::NuMax).unwrap().median, 18.0);
        let sigma = summary.get(ParameterName::Sigma).unwrap().uncertain();
        assert_eq!(sigma.value, 19.0);
        assert!((sigma.error - 0.5).abs() < 1e-12);
    }

    #[test]
    fn noise_summary_defaults_missing_oscillation_keys() {
        let (_tmp, run) = run_with(ModelVariant::NoiseOnly, 7);
        let reader = SummaryReader::new(&run);

        assert_eq!(reader.get().unwrap().len(), 7);
        assert!(reader.get().unwrap().get(ParameterName::Height).is_none());
        assert!(reader.parameter(ParameterName::Height).unwrap().median.is_nan());
        assert_eq!(reader.get().unwrap().medians().len(), 7);
    }

    #[test]
    fn row_count_must_match_variant() {
        let (_tmp, run) = run_with(ModelVariant::Full, 7);
        let err = SummaryReader::new(&run).get().unwrap_err();
        assert_eq!(err.exit_code(), 3);

        let err = ParameterSummary::from_rows(&vec![vec![0.0; 7]; 8], Path::new("s.txt")).unwrap_err();
        assert!(err.to_string().contains("8 parameter rows"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let run = StarLayout::new("KIC3", tmp.path()).run(ModelVariant::Full);
        let err = SummaryReader::new(&run).get().unwrap_err();
        assert!(err.is_missing_file());
    }

    #[test]
    fn parse_is_cached_after_first_read() {
        let (_tmp, run) = run_with(ModelVariant::NoiseOnly, 7);
        let reader = SummaryReader::new(&run);
        reader.get().unwrap();
        std::fs::remove_file(run.summary_file()).unwrap();
        assert_eq!(reader.get().unwrap().len(), 7);
    }
}
