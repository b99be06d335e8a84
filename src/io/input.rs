//! Sampler input files.
//!
//! Everything the sampler reads for one star is written here, into the star
//! directory, before any process is launched. Output is deterministic: the
//! same request and config always produce byte-identical files.

use std::fs;

use tracing::{debug, info};

use crate::domain::{ModelVariant, PipelineConfig, RunRequest};
use crate::error::{PipelineError, Result};
use crate::io::layout::StarLayout;
use crate::io::table::{write_lines, write_table};

pub struct InputWriter<'a> {
    config: &'a PipelineConfig,
}

impl<'a> InputWriter<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Write all input files for `request` and return the star layout.
    ///
    /// Both run directories are created here as well, so concurrently running
    /// variants never share a directory-creation step.
    pub fn write(&self, request: &RunRequest) -> Result<StarLayout> {
        let layout = StarLayout::from_config(self.config, request.star_id());
        let dir = layout.dir();

        if self.config.clear_star_dir && dir.exists() {
            debug!(dir = %dir.display(), "clearing previous star directory");
            fs::remove_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
        }
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

        // 1) Spectrum.
        write_table(
            &layout.data_file(),
            request.spectrum().iter().map(|&(f, p)| [f, p]),
        )?;

        // 2) Priors: Full gets all rows, NoiseOnly the leading seven.
        for variant in ModelVariant::ALL {
            write_table(
                &layout.prior_file(variant),
                request
                    .priors_for(variant)
                    .iter()
                    .map(|b| [b.lower, b.upper]),
            )?;
        }

        // 3) Sampler and clustering tuning.
        let tuning = &self.config.tuning;
        write_table(&layout.nsmc_file(), tuning.nsmc.iter().map(|&v| [v]))?;
        write_lines(&layout.xmeans_file(), tuning.xmeans.iter().map(|v| v.to_string()))?;

        // 4) Nyquist frequency.
        write_table(&layout.nyquist_file(), [[request.nyquist()]])?;

        for variant in ModelVariant::ALL {
            let run_dir = layout.run(variant);
            fs::create_dir_all(run_dir.dir()).map_err(|e| PipelineError::io(run_dir.dir(), e))?;
        }

        info!(
            star_id = request.star_id(),
            samples = request.spectrum().len(),
            dir = %dir.display(),
            "wrote sampler inputs"
        );
        Ok(layout)
    }
}
