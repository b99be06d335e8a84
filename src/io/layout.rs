//! On-disk layout shared with the sampler.
//!
//! ```text
//! <results_root>/<star_id>/
//!     <star_id>.txt                      spectrum
//!     hyperParameters.txt                Full priors
//!     hyperParameters_noise.txt          NoiseOnly priors
//!     NSMC_configuringParameters.txt
//!     Xmeans_configuringParameters.txt
//!     NyquistFrequency.txt
//!     Noise/         background_* outputs of the NoiseOnly run
//!     Oscillation/   background_* outputs of the Full run
//! ```

use std::path::{Path, PathBuf};

use crate::domain::{ModelVariant, ParameterName, PipelineConfig};

/// Prefix of every file the sampler writes into a run directory.
pub const OUTPUT_PREFIX: &str = "background";

pub const NSMC_FILE: &str = "NSMC_configuringParameters.txt";
pub const XMEANS_FILE: &str = "Xmeans_configuringParameters.txt";
pub const NYQUIST_FILE: &str = "NyquistFrequency.txt";

/// Paths of one star's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarLayout {
    star_id: String,
    dir: PathBuf,
}

impl StarLayout {
    pub fn new(star_id: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            star_id: star_id.into(),
            dir: dir.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig, star_id: &str) -> Self {
        Self::new(star_id, config.star_dir(star_id))
    }

    pub fn star_id(&self) -> &str {
        &self.star_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn data_file(&self) -> PathBuf {
        self.dir.join(format!("{}.txt", self.star_id))
    }

    pub fn prior_file(&self, variant: ModelVariant) -> PathBuf {
        self.dir.join(format!("{}.txt", variant.prior_stem()))
    }

    pub fn nsmc_file(&self) -> PathBuf {
        self.dir.join(NSMC_FILE)
    }

    pub fn xmeans_file(&self) -> PathBuf {
        self.dir.join(XMEANS_FILE)
    }

    pub fn nyquist_file(&self) -> PathBuf {
        self.dir.join(NYQUIST_FILE)
    }

    pub fn run(&self, variant: ModelVariant) -> RunLayout {
        RunLayout {
            variant,
            star_dir: self.dir.clone(),
            dir: self.dir.join(variant.run_dir_name()),
        }
    }
}

/// Paths of one variant's run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    variant: ModelVariant,
    star_dir: PathBuf,
    dir: PathBuf,
}

impl RunLayout {
    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The star directory this run lives in.
    pub fn star_dir(&self) -> &Path {
        &self.star_dir
    }

    fn output(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{OUTPUT_PREFIX}_{name}.txt"))
    }

    pub fn summary_file(&self) -> PathBuf {
        self.output("parameterSummary")
    }

    pub fn evidence_file(&self) -> PathBuf {
        self.output("evidenceInformation")
    }

    /// Priors as the sampler actually used them.
    pub fn run_prior_file(&self) -> PathBuf {
        self.output("hyperParametersUniform")
    }

    pub fn trace_file(&self, parameter: ParameterName) -> PathBuf {
        self.output(&format!("parameter{:03}", parameter.index()))
    }

    pub fn marginal_file(&self, parameter: ParameterName) -> PathBuf {
        self.output(&format!("marginalDistribution{:03}", parameter.index()))
    }

    /// Files whose presence after exit makes a run Good.
    pub fn mandatory_outputs(&self) -> [PathBuf; 2] {
        [self.evidence_file(), self.summary_file()]
    }

    /// Mandatory outputs that do not exist yet.
    pub fn missing_outputs(&self) -> Vec<PathBuf> {
        self.mandatory_outputs()
            .into_iter()
            .filter(|p| !p.is_file())
            .collect()
    }
}
