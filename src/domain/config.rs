//! Pipeline configuration.
//!
//! One immutable [`PipelineConfig`] is passed explicitly into every call;
//! nothing in the crate reads process-wide settings on its own.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PipelineError, Result};

/// Attempts per variant when nothing else is configured.
///
/// Two bounds have been used for this operation in practice: 2 and 10.
/// We default to the larger one since sampler failures are mostly transient.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Per-attempt deadline when nothing else is configured.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);

/// Opaque tuning vectors copied verbatim into the sampler's configuration files.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerTuning {
    /// Nested-sampler settings: initial/minimum live points, max draw
    /// attempts, iterations before clustering, iterations per clustering,
    /// initial enlargement fraction, shrinking rate, termination factor.
    pub nsmc: [f64; 8],
    /// Minimum and maximum number of clusters.
    pub xmeans: [u32; 2],
}

impl Default for SamplerTuning {
    fn default() -> Self {
        Self {
            nsmc: [500.0, 500.0, 50000.0, 1500.0, 50.0, 2.10, 0.01, 0.1],
            xmeans: [1, 10],
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path of the sampler executable.
    pub sampler_binary: PathBuf,
    /// Root below which one directory per star is created.
    pub results_root: PathBuf,
    /// Upper bound on sampler launches per variant (>= 1).
    pub max_attempts: usize,
    /// Deadline for one sampler attempt.
    pub attempt_timeout: Duration,
    /// When false, no process is launched and existing outputs are validated.
    pub run_sampler: bool,
    /// Remove an existing star directory before writing inputs.
    pub clear_star_dir: bool,
    pub tuning: SamplerTuning,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sampler_binary: PathBuf::from("background"),
            results_root: PathBuf::from("results"),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            run_sampler: true,
            clear_star_dir: false,
            tuning: SamplerTuning::default(),
        }
    }
}

impl PipelineConfig {
    /// Build a config from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, starting from defaults.
    ///
    /// Recognized keys:
    /// - `BGFIT_SAMPLER_BINARY`
    /// - `BGFIT_RESULTS_DIR`
    /// - `BGFIT_MAX_ATTEMPTS`
    /// - `BGFIT_ATTEMPT_TIMEOUT_SECS`
    /// - `BGFIT_RUN_SAMPLER` (`true`/`false`/`1`/`0`)
    /// - `BGFIT_CLEAR_STAR_DIR`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("BGFIT_SAMPLER_BINARY") {
            config.sampler_binary = PathBuf::from(v);
        }
        if let Some(v) = lookup("BGFIT_RESULTS_DIR") {
            config.results_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("BGFIT_MAX_ATTEMPTS") {
            config.max_attempts = v.trim().parse().map_err(|_| {
                PipelineError::Config(format!("BGFIT_MAX_ATTEMPTS must be a positive integer, got '{v}'."))
            })?;
        }
        if let Some(v) = lookup("BGFIT_ATTEMPT_TIMEOUT_SECS") {
            let secs: u64 = v.trim().parse().map_err(|_| {
                PipelineError::Config(format!(
                    "BGFIT_ATTEMPT_TIMEOUT_SECS must be a whole number of seconds, got '{v}'."
                ))
            })?;
            config.attempt_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = lookup("BGFIT_RUN_SAMPLER") {
            config.run_sampler = parse_flag("BGFIT_RUN_SAMPLER", &v)?;
        }
        if let Some(v) = lookup("BGFIT_CLEAR_STAR_DIR") {
            config.clear_star_dir = parse_flag("BGFIT_CLEAR_STAR_DIR", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PipelineError::Config("max_attempts must be >= 1.".to_string()));
        }
        if self.attempt_timeout.is_zero() {
            return Err(PipelineError::Config("attempt_timeout must be > 0.".to_string()));
        }
        if self.sampler_binary.as_os_str().is_empty() {
            return Err(PipelineError::Config("sampler_binary is empty.".to_string()));
        }
        if self.tuning.xmeans[0] > self.tuning.xmeans[1] {
            return Err(PipelineError::Config(format!(
                "Clustering bounds out of order: min={} > max={}.",
                self.tuning.xmeans[0], self.tuning.xmeans[1]
            )));
        }
        Ok(())
    }

    /// Directory holding all inputs and runs for `star_id`.
    pub fn star_dir(&self, star_id: &str) -> PathBuf {
        self.results_root.join(star_id)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PipelineError::Config(format!("{key} must be a boolean, got '{value}'."))),
    }
}
