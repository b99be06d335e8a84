//! Analytic background model.
//!
//! The background is the sum of a white-noise floor, three Harvey-like
//! components (long-term trend and two granulation scales) and, for the Full
//! variant, a Gaussian oscillation envelope. Every frequency-dependent term is
//! multiplied by the apodization of the sampling (a sinc² response that drops
//! towards the nyquist frequency).

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

use serde::{Deserialize, Serialize};

use crate::domain::{ModelVariant, ParameterName};
use crate::error::{PipelineError, Result};
use crate::results::summary::ParameterSummary;

/// Normalization of a Harvey component with exponent 4.
pub const HARVEY_ZETA: f64 = 2.0 * SQRT_2 / PI;

/// Response of a sampled signal at `f`: `sinc²(π/2 · f/nyquist)`, 1 at `f = 0`.
pub fn apodization(f: f64, nyquist: f64) -> f64 {
    let x = FRAC_PI_2 * f / nyquist;
    if x == 0.0 {
        return 1.0;
    }
    let sinc = x.sin() / x;
    sinc * sinc
}

/// Harvey profile `(σ²/b) / (1 + (f/b)⁴)`.
pub fn harvey(sigma: f64, b: f64, f: f64) -> f64 {
    (sigma * sigma / b) / (1.0 + (f / b).powi(4))
}

/// Gaussian oscillation envelope of height `h` centred on `nu_max`.
pub fn gaussian_envelope(h: f64, nu_max: f64, width: f64, f: f64) -> f64 {
    let d = f - nu_max;
    h * (-(d * d) / (2.0 * width * width)).exp()
}

/// Component curves of a background fit, aligned to one frequency grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundModel {
    pub frequencies: Vec<f64>,
    pub long_trend: Vec<f64>,
    pub granulation_1: Vec<f64>,
    pub granulation_2: Vec<f64>,
    pub white_noise: Vec<f64>,
    /// Present for the Full variant only.
    pub oscillation: Option<Vec<f64>>,
}

impl BackgroundModel {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Sum of all components at each grid point.
    pub fn total(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| {
                self.long_trend[i]
                    + self.granulation_1[i]
                    + self.granulation_2[i]
                    + self.white_noise[i]
                    + self.oscillation.as_ref().map_or(0.0, |o| o[i])
            })
            .collect()
    }
}

/// Rebuild the background curves from the medians of a parameter summary.
pub fn reconstruct(
    summary: &ParameterSummary,
    nyquist: f64,
    variant: ModelVariant,
    frequencies: &[f64],
) -> Result<BackgroundModel> {
    let p = summary.medians();
    if p.len() != variant.param_count() {
        return Err(PipelineError::value(format!(
            "{variant} model needs {} parameters, summary has {}.",
            variant.param_count(),
            p.len()
        )));
    }
    reconstruct_from_medians(&p, nyquist, frequencies)
}

/// Same as [`reconstruct`] for a bare median vector (7 or 10 entries).
pub fn reconstruct_from_medians(p: &[f64], nyquist: f64, frequencies: &[f64]) -> Result<BackgroundModel> {
    let variant = ModelVariant::from_param_count(p.len()).ok_or_else(|| {
        PipelineError::value(format!("Background model needs 7 or 10 parameters, got {}.", p.len()))
    })?;
    if let Some(i) = p.iter().position(|v| !v.is_finite()) {
        return Err(PipelineError::value(format!(
            "Median of {} is {}; cannot rebuild the {variant} background.",
            ParameterName::ALL[i].key(),
            p[i]
        )));
    }
    if !(nyquist.is_finite() && nyquist > 0.0) {
        return Err(PipelineError::value(format!(
            "Invalid nyquist frequency {nyquist} for background model."
        )));
    }

    let apod: Vec<f64> = frequencies.iter().map(|&f| apodization(f, nyquist)).collect();
    let harvey_curve = |sigma: f64, b: f64| -> Vec<f64> {
        frequencies
            .iter()
            .zip(&apod)
            .map(|(&f, &a)| HARVEY_ZETA * harvey(sigma, b, f) * a)
            .collect()
    };

    let oscillation = match variant {
        ModelVariant::NoiseOnly => None,
        ModelVariant::Full => Some(
            frequencies
                .iter()
                .zip(&apod)
                .map(|(&f, &a)| gaussian_envelope(p[7], p[8], p[9], f) * a)
                .collect(),
        ),
    };

    Ok(BackgroundModel {
        frequencies: frequencies.to_vec(),
        long_trend: harvey_curve(p[1], p[2]),
        granulation_1: harvey_curve(p[3], p[4]),
        granulation_2: harvey_curve(p[5], p[6]),
        white_noise: vec![p[0]; frequencies.len()],
        oscillation,
    })
}
