//! Marginal posterior distributions (`background_marginalDistribution00<i>.txt`).
//!
//! Each file holds a parameter grid and the marginal density on it. Combined
//! with a parameter's credible limits, the distribution yields the region a
//! plot would shade around the median.

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{PRIOR_COUNT, ParameterName};
use crate::error::{PipelineError, Result};
use crate::io::layout::RunLayout;
use crate::io::table::read_table;
use crate::results::cached;
use crate::results::summary::SummaryStatistics;
use crate::results::trace::ensure_fitted;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginalDistribution {
    pub grid: Vec<f64>,
    pub density: Vec<f64>,
}

/// Median and credible limits of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredibleLimits {
    pub median: f64,
    pub lower: f64,
    pub upper: f64,
}

impl From<&SummaryStatistics> for CredibleLimits {
    fn from(s: &SummaryStatistics) -> Self {
        Self {
            median: s.median,
            lower: s.lower_credible_limit,
            upper: s.upper_credible_limit,
        }
    }
}

/// Symmetric band around the median with the grid points inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadedRegion {
    pub center: f64,
    pub half_width: f64,
    pub lower: f64,
    pub upper: f64,
    /// `mask[i]` is true when `grid[i]` lies inside `[lower, upper]`.
    pub mask: Vec<bool>,
}

impl MarginalDistribution {
    /// Accepts two rows of M values (grid row, density row) or M rows of
    /// `grid density`. Two rows of equal length always read as grid/density
    /// rows, so a 2×2 file is a two-point grid given row-wise.
    pub fn from_rows(rows: &[Vec<f64>], origin: &Path) -> Result<Self> {
        let (grid, density): (Vec<f64>, Vec<f64>) = if rows.len() == 2 && rows[0].len() == rows[1].len() {
            (rows[0].clone(), rows[1].clone())
        } else if !rows.is_empty() && rows.iter().all(|r| r.len() == 2) {
            rows.iter().map(|r| (r[0], r[1])).unzip()
        } else {
            return Err(PipelineError::value(format!(
                "{}: marginal distribution must be M×2 or 2×M.",
                origin.display()
            )));
        };

        if grid.is_empty() {
            return Err(PipelineError::value(format!(
                "{}: marginal distribution is empty.",
                origin.display()
            )));
        }
        Ok(Self { grid, density })
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Band of half-width `sqrt(lo² + hi²) / sqrt(2)` around the median, where
    /// `lo` and `hi` are the distances from the median to each credible limit.
    pub fn shaded(&self, limits: CredibleLimits) -> ShadedRegion {
        let lower_err = limits.median - limits.lower;
        let upper_err = limits.upper - limits.median;
        let half_width = (lower_err * lower_err + upper_err * upper_err).sqrt() / std::f64::consts::SQRT_2;
        let lower = limits.median - half_width;
        let upper = limits.median + half_width;

        ShadedRegion {
            center: limits.median,
            half_width,
            lower,
            upper,
            mask: self.grid.iter().map(|&x| x >= lower && x <= upper).collect(),
        }
    }
}

#[derive(Debug)]
pub struct MarginalReader {
    run: RunLayout,
    cache: [OnceLock<MarginalDistribution>; PRIOR_COUNT],
}

impl MarginalReader {
    pub fn new(run: &RunLayout) -> Self {
        Self {
            run: run.clone(),
            cache: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    pub fn get(&self, name: ParameterName) -> Result<&MarginalDistribution> {
        ensure_fitted(self.run.variant(), name)?;
        cached(&self.cache[name.index()], || {
            let path = self.run.marginal_file(name);
            debug!(path = %path.display(), parameter = %name, "reading marginal distribution");
            MarginalDistribution::from_rows(&read_table(&path)?, &path)
        })
    }

    pub fn shaded(&self, name: ParameterName, limits: CredibleLimits) -> Result<ShadedRegion> {
        Ok(self.get(name)?.shaded(limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelVariant;
    use crate::io::layout::StarLayout;

    #[test]
    fn accepts_both_layouts() {
        let columns = vec![vec![1.0, 0.1], vec![2.0, 0.5], vec![3.0, 0.2]];
        let rows = vec![vec![1.0, 2.0, 3.0], vec![0.1, 0.5, 0.2]];
        let a = MarginalDistribution::from_rows(&columns, Path::new("m")).unwrap();
        let b = MarginalDistribution::from_rows(&rows, Path::new("m")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);

        assert!(MarginalDistribution::from_rows(&[vec![1.0, 2.0, 3.0]], Path::new("m")).is_err());
    }

    #[test]
    fn square_two_by_two_reads_as_grid_and_density_rows() {
        let rows = vec![vec![1.0, 2.0], vec![0.3, 0.7]];
        let dist = MarginalDistribution::from_rows(&rows, Path::new("m")).unwrap();
        assert_eq!(dist.grid, vec![1.0, 2.0]);
        assert_eq!(dist.density, vec![0.3, 0.7]);
    }

    #[test]
    fn shaded_half_width_combines_both_errors() {
        let dist = MarginalDistribution {
            grid: vec![6.0, 8.5, 10.0, 11.5, 14.0],
            density: vec![0.0; 5],
        };
        // lo = 3, hi = 4 -> sqrt(25)/sqrt(2)
        let region = dist.shaded(CredibleLimits { median: 10.0, lower: 7.0, upper: 14.0 });
        let expected = 5.0 / 2f64.sqrt();
        assert!((region.half_width - expected).abs() < 1e-12);
        assert!((region.lower - (10.0 - expected)).abs() < 1e-12);
        assert_eq!(region.mask, vec![false, true, true, true, false]);
    }

    #[test]
    fn reader_rejects_unfitted_parameter() {
        let tmp = tempfile::tempdir().unwrap();
        let run = StarLayout::new("KIC2", tmp.path()).run(ModelVariant::NoiseOnly);
        let reader = MarginalReader::new(&run);
        assert_eq!(reader.get(ParameterName::Sigma).unwrap_err().exit_code(), 3);
        assert!(reader.get(ParameterName::WhiteNoise).unwrap_err().is_missing_file());
    }
}
