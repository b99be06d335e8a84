//! Model comparison (NoiseOnly vs Full) with a Bayes factor.
//!
//! `ln K = ln Z_full − ln Z_noise`. Strength classes on the natural-log scale:
//!
//! | ln K               | strength     |
//! |--------------------|--------------|
//! | `≤ ln 1`           | Inconclusive |
//! | `(ln 1, ln 2.5)`   | Weak         |
//! | `[ln 2.5, ln 5)`   | Moderate     |
//! | `≥ ln 5`           | Strong       |
//!
//! A factor of exactly 1 (identical evidence) carries no information and is
//! therefore Inconclusive rather than Weak.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ModelVariant;
use crate::results::evidence::Evidence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvidenceStrength {
    Inconclusive,
    Weak,
    Moderate,
    Strong,
}

impl EvidenceStrength {
    /// Classify a natural-log Bayes factor.
    pub fn classify(log_bayes_factor: f64) -> Self {
        if !log_bayes_factor.is_finite() || log_bayes_factor <= 1f64.ln() {
            EvidenceStrength::Inconclusive
        } else if log_bayes_factor < 2.5f64.ln() {
            EvidenceStrength::Weak
        } else if log_bayes_factor < 5f64.ln() {
            EvidenceStrength::Moderate
        } else {
            EvidenceStrength::Strong
        }
    }
}

impl fmt::Display for EvidenceStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvidenceStrength::Inconclusive => "inconclusive",
            EvidenceStrength::Weak => "weak",
            EvidenceStrength::Moderate => "moderate",
            EvidenceStrength::Strong => "strong",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesComparison {
    #[serde(with = "crate::io::export::non_finite_as_null")]
    pub log_bayes_factor: f64,
    pub strength: EvidenceStrength,
    /// Full when the oscillation model is favoured at all, else NoiseOnly.
    pub preferred: ModelVariant,
}

/// Compare the Full and NoiseOnly evidences.
pub fn compare_models(full: &Evidence, noise: &Evidence) -> BayesComparison {
    let log_bayes_factor = full.log_evidence - noise.log_evidence;
    let preferred = if log_bayes_factor > 0.0 {
        ModelVariant::Full
    } else {
        ModelVariant::NoiseOnly
    };

    BayesComparison {
        log_bayes_factor,
        strength: EvidenceStrength::classify(log_bayes_factor),
        preferred,
    }
}
