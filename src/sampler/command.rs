//! Sampler command lines.

use std::fmt;
use std::path::PathBuf;

use crate::domain::{ModelVariant, PipelineConfig};
use crate::io::layout::{RunLayout, StarLayout};

/// A fully resolved sampler invocation for one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Where the sampler writes this variant's outputs.
    pub run: RunLayout,
}

impl SamplerCommand {
    /// `<binary> <star_dir> <star_id> <run_dir_name> <model_name> <prior_stem>`,
    /// executed from the star directory.
    pub fn for_variant(config: &PipelineConfig, layout: &StarLayout, variant: ModelVariant) -> Self {
        Self {
            program: config.sampler_binary.clone(),
            args: vec![
                layout.dir().display().to_string(),
                layout.star_id().to_string(),
                variant.run_dir_name().to_string(),
                variant.model_name().to_string(),
                variant.prior_stem().to_string(),
            ],
            working_dir: layout.dir().to_path_buf(),
            run: layout.run(variant),
        }
    }

    pub fn variant(&self) -> ModelVariant {
        self.run.variant()
    }
}

impl fmt::Display for SamplerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
