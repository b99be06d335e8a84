//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the writer, orchestrator and readers
//! - exported to JSON alongside a finished analysis

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Number of prior-bound pairs a request always carries (Full variant).
pub const PRIOR_COUNT: usize = 10;

/// Which background model the sampler fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    /// White noise plus three Harvey components.
    NoiseOnly,
    /// Noise plus a Gaussian oscillation envelope.
    Full,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 2] = [ModelVariant::NoiseOnly, ModelVariant::Full];

    pub fn param_count(self) -> usize {
        match self {
            ModelVariant::NoiseOnly => 7,
            ModelVariant::Full => 10,
        }
    }

    /// Background model name understood by the sampler.
    pub fn model_name(self) -> &'static str {
        match self {
            ModelVariant::NoiseOnly => "ThreeHarveyNoGaussian",
            ModelVariant::Full => "ThreeHarvey",
        }
    }

    /// Name of the per-variant run directory below the star directory.
    pub fn run_dir_name(self) -> &'static str {
        match self {
            ModelVariant::NoiseOnly => "Noise",
            ModelVariant::Full => "Oscillation",
        }
    }

    /// File stem of the global prior file for this variant.
    pub fn prior_stem(self) -> &'static str {
        match self {
            ModelVariant::NoiseOnly => "hyperParameters_noise",
            ModelVariant::Full => "hyperParameters",
        }
    }

    /// Variant whose parameter count is `n`, if any.
    pub fn from_param_count(n: usize) -> Option<Self> {
        match n {
            7 => Some(ModelVariant::NoiseOnly),
            10 => Some(ModelVariant::Full),
            _ => None,
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::NoiseOnly => f.write_str("NoiseOnly"),
            ModelVariant::Full => f.write_str("Full"),
        }
    }
}

/// Canonical background parameters, in sampler file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterName {
    /// White-noise floor.
    WhiteNoise,
    LongTrendAmplitude,
    LongTrendFrequency,
    Granulation1Amplitude,
    Granulation1Frequency,
    Granulation2Amplitude,
    Granulation2Frequency,
    /// Height of the oscillation envelope.
    Height,
    NuMax,
    /// Width of the oscillation envelope.
    Sigma,
}

impl ParameterName {
    pub const ALL: [ParameterName; PRIOR_COUNT] = [
        ParameterName::WhiteNoise,
        ParameterName::LongTrendAmplitude,
        ParameterName::LongTrendFrequency,
        ParameterName::Granulation1Amplitude,
        ParameterName::Granulation1Frequency,
        ParameterName::Granulation2Amplitude,
        ParameterName::Granulation2Frequency,
        ParameterName::Height,
        ParameterName::NuMax,
        ParameterName::Sigma,
    ];

    /// Parameters fitted by `variant`, in file order.
    pub fn for_variant(variant: ModelVariant) -> &'static [ParameterName] {
        &Self::ALL[..variant.param_count()]
    }

    /// Zero-based index in the sampler's output files.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            ParameterName::WhiteNoise => "w",
            ParameterName::LongTrendAmplitude => "sigma_long",
            ParameterName::LongTrendFrequency => "b_long",
            ParameterName::Granulation1Amplitude => "sigma_gran_1",
            ParameterName::Granulation1Frequency => "b_gran_1",
            ParameterName::Granulation2Amplitude => "sigma_gran_2",
            ParameterName::Granulation2Frequency => "b_gran_2",
            ParameterName::Height => "h_osc",
            ParameterName::NuMax => "nu_max",
            ParameterName::Sigma => "sigma",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Status of one sampler run for one `(star, variant)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Good,
    LikelihoodFailure,
    CovarianceFailure,
    AssertionFailure,
    MatrixDecompositionFailure,
    /// The process exited cleanly but a mandatory output file is missing.
    IncompleteOutput,
    /// The attempt hit its deadline and was killed.
    TimedOut,
}

impl RunStatus {
    pub fn is_good(self) -> bool {
        self == RunStatus::Good
    }

    /// Any terminal, non-Good attempt outcome.
    pub fn is_failure(self) -> bool {
        !matches!(self, RunStatus::Running | RunStatus::Good)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Good => "good",
            RunStatus::LikelihoodFailure => "likelihood failure",
            RunStatus::CovarianceFailure => "covariance failure",
            RunStatus::AssertionFailure => "assertion failure",
            RunStatus::MatrixDecompositionFailure => "matrix decomposition failure",
            RunStatus::IncompleteOutput => "incomplete output",
            RunStatus::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}

/// Uniform prior range for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorBound {
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub lower: f64,
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub upper: f64,
}

impl PriorBound {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

impl From<(f64, f64)> for PriorBound {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self { lower, upper }
    }
}

/// A value with a symmetric uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertainValue {
    pub value: f64,
    pub error: f64,
}

impl fmt::Display for UncertainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} ± {:.4}", self.value, self.error)
    }
}

/// Everything the sampler needs for one star.
///
/// Construct through [`RunRequest::new`], which validates the inputs once so
/// downstream code can rely on them.
#[derive(Debug, Clone)]
pub struct RunRequest {
    star_id: String,
    spectrum: Vec<(f64, f64)>,
    nyquist: f64,
    priors: [PriorBound; PRIOR_COUNT],
}

impl RunRequest {
    pub fn new(
        star_id: impl Into<String>,
        spectrum: Vec<(f64, f64)>,
        nyquist: f64,
        priors: [PriorBound; PRIOR_COUNT],
    ) -> Result<Self> {
        let star_id = star_id.into();
        let trimmed = star_id.trim();
        if trimmed.is_empty() || trimmed != star_id {
            return Err(PipelineError::value(format!(
                "Invalid star id '{star_id}': must be non-empty without surrounding whitespace."
            )));
        }
        if star_id.contains(['/', '\\']) || star_id == "." || star_id == ".." {
            return Err(PipelineError::value(format!(
                "Invalid star id '{star_id}': must not contain path separators."
            )));
        }
        if spectrum.is_empty() {
            return Err(PipelineError::value("Power spectrum is empty."));
        }
        if let Some(idx) = spectrum
            .iter()
            .position(|(f, p)| !(f.is_finite() && p.is_finite()))
        {
            return Err(PipelineError::value(format!(
                "Power spectrum sample {idx} is not finite."
            )));
        }
        if !(nyquist.is_finite() && nyquist > 0.0) {
            return Err(PipelineError::value(format!(
                "Invalid nyquist frequency {nyquist} (must be finite and > 0)."
            )));
        }
        for (name, bound) in ParameterName::ALL.iter().zip(priors.iter()) {
            if !(bound.lower.is_finite() && bound.upper.is_finite() && bound.lower < bound.upper) {
                return Err(PipelineError::value(format!(
                    "Invalid prior for {name}: [{}, {}] (must be finite with lower < upper).",
                    bound.lower, bound.upper
                )));
            }
        }

        Ok(Self {
            star_id,
            spectrum,
            nyquist,
            priors,
        })
    }

    pub fn star_id(&self) -> &str {
        &self.star_id
    }

    pub fn spectrum(&self) -> &[(f64, f64)] {
        &self.spectrum
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.spectrum.iter().map(|(f, _)| *f).collect()
    }

    pub fn nyquist(&self) -> f64 {
        self.nyquist
    }

    pub fn priors(&self) -> &[PriorBound; PRIOR_COUNT] {
        &self.priors
    }

    /// Prior rows the sampler reads for `variant`.
    pub fn priors_for(&self, variant: ModelVariant) -> &[PriorBound] {
        &self.priors[..variant.param_count()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priors() -> [PriorBound; PRIOR_COUNT] {
        [PriorBound::new(0.5, 5.0); PRIOR_COUNT]
    }

    #[test]
    fn parameter_names_follow_variant_counts() {
        assert_eq!(ParameterName::for_variant(ModelVariant::NoiseOnly).len(), 7);
        assert_eq!(ParameterName::for_variant(ModelVariant::Full).len(), 10);
        assert_eq!(ParameterName::NuMax.index(), 8);
        assert_eq!(ParameterName::from_key("b_gran_2"), Some(ParameterName::Granulation2Frequency));
        assert_eq!(ModelVariant::from_param_count(8), None);
    }

    #[test]
    fn request_rejects_bad_inputs() {
        let spectrum = vec![(1.0, 2.0), (2.0, 3.0)];
        assert!(RunRequest::new("KIC1", spectrum.clone(), 283.2, priors()).is_ok());
        assert!(RunRequest::new("", spectrum.clone(), 283.2, priors()).is_err());
        assert!(RunRequest::new("a/b", spectrum.clone(), 283.2, priors()).is_err());
        assert!(RunRequest::new("KIC1", Vec::new(), 283.2, priors()).is_err());
        assert!(RunRequest::new("KIC1", spectrum.clone(), 0.0, priors()).is_err());

        let mut inverted = priors();
        inverted[3] = PriorBound::new(2.0, 1.0);
        let err = RunRequest::new("KIC1", spectrum, 283.2, inverted).unwrap_err();
        assert!(err.to_string().contains("sigma_gran_1"));
    }

    #[test]
    fn failure_states_exclude_running_and_good() {
        assert!(!RunStatus::Running.is_failure());
        assert!(!RunStatus::Good.is_failure());
        assert!(RunStatus::TimedOut.is_failure());
        assert!(RunStatus::IncompleteOutput.is_failure());
    }
}
