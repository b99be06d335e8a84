//! Prior bounds as used by a run.
//!
//! The sampler copies the priors it actually used into the run directory.
//! When that copy is absent (sampler disabled, or an older sampler build),
//! the global prior files written next to the run directory are read instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ModelVariant, ParameterName, PriorBound};
use crate::error::{PipelineError, Result};
use crate::io::layout::{RunLayout, StarLayout};
use crate::io::table::{read_table, require_columns};
use crate::results::cached;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorSet {
    variant: ModelVariant,
    bounds: BTreeMap<ParameterName, PriorBound>,
}

impl PriorSet {
    /// 7 rows make a NoiseOnly set, 10 rows a Full set.
    pub fn from_rows(rows: &[Vec<f64>], origin: &Path) -> Result<Self> {
        require_columns(rows, 2, origin)?;
        let variant = ModelVariant::from_param_count(rows.len()).ok_or_else(|| {
            PipelineError::value(format!(
                "{}: {} prior rows, expected 7 or 10.",
                origin.display(),
                rows.len()
            ))
        })?;

        let bounds = ParameterName::for_variant(variant)
            .iter()
            .zip(rows)
            .map(|(&name, row)| (name, PriorBound::new(row[0], row[1])))
            .collect();
        Ok(Self { variant, bounds })
    }

    pub fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "reading priors");
        Self::from_rows(&read_table(path)?, path)
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn get(&self, name: ParameterName) -> Option<PriorBound> {
        self.bounds.get(&name).copied()
    }

    /// Bounds in file order.
    pub fn bounds(&self) -> Vec<PriorBound> {
        self.bounds.values().copied().collect()
    }
}

/// Both global prior files of a star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalPriors {
    pub noise: PriorSet,
    pub full: PriorSet,
}

impl GlobalPriors {
    pub fn read(star_dir: &Path) -> Result<Self> {
        let layout = StarLayout::new("", star_dir);
        let noise = PriorSet::read(&layout.prior_file(ModelVariant::NoiseOnly))?;
        let full = PriorSet::read(&layout.prior_file(ModelVariant::Full))?;
        for (set, expected) in [(&noise, ModelVariant::NoiseOnly), (&full, ModelVariant::Full)] {
            if set.variant() != expected {
                return Err(PipelineError::value(format!(
                    "{}: {expected} prior file holds {} rows.",
                    star_dir.display(),
                    set.len()
                )));
            }
        }
        Ok(Self { noise, full })
    }

    pub fn for_variant(&self, variant: ModelVariant) -> &PriorSet {
        match variant {
            ModelVariant::NoiseOnly => &self.noise,
            ModelVariant::Full => &self.full,
        }
    }
}

#[derive(Debug)]
pub struct PriorReader {
    run_file: PathBuf,
    star_dir: PathBuf,
    variant: ModelVariant,
    cache: OnceLock<PriorSet>,
}

impl PriorReader {
    pub fn new(run: &RunLayout) -> Self {
        Self {
            run_file: run.run_prior_file(),
            star_dir: run.star_dir().to_path_buf(),
            variant: run.variant(),
            cache: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Result<&PriorSet> {
        cached(&self.cache, || {
            let set = if self.run_file.is_file() {
                PriorSet::read(&self.run_file)?
            } else {
                debug!(star_dir = %self.star_dir.display(), "run priors absent, using global prior files");
                self.global()?.for_variant(self.variant).clone()
            };
            if set.variant() != self.variant {
                return Err(PipelineError::value(format!(
                    "Priors for {} run hold {} rows.",
                    self.variant,
                    set.len()
                )));
            }
            Ok(set)
        })
    }

    /// Both global prior files from the star directory.
    pub fn global(&self) -> Result<GlobalPriors> {
        GlobalPriors::read(&self.star_dir)
    }
}
