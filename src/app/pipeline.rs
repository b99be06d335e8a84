//! Shared "analyze one star" workflow.
//!
//! write inputs -> run both variants (concurrently) -> read results ->
//! reconstruct backgrounds -> compare evidences
//!
//! Report formatting and JSON export build on the returned [`StarAnalysis`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::compare::{BayesComparison, compare_models};
use crate::domain::{ModelVariant, PipelineConfig, RunRequest};
use crate::error::{PipelineError, Result};
use crate::io::input::InputWriter;
use crate::io::layout::StarLayout;
use crate::models::{BackgroundModel, reconstruct};
use crate::results::{Evidence, ParameterSummary, PriorSet, VariantResults};
use crate::sampler::{CancelToken, Orchestrator, ProcessLauncher, RunReport, SamplerCommand};

/// Everything computed for one variant of one star.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantAnalysis {
    pub report: RunReport,
    pub summary: ParameterSummary,
    pub evidence: Evidence,
    /// Priors as used; absent when no prior file could be read.
    pub priors: Option<PriorSet>,
    pub background: BackgroundModel,
}

/// All computed outputs of a single star analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarAnalysis {
    pub star_id: String,
    pub nyquist: f64,
    pub noise: VariantAnalysis,
    pub full: VariantAnalysis,
    pub comparison: BayesComparison,
}

impl StarAnalysis {
    pub fn variant(&self, variant: ModelVariant) -> &VariantAnalysis {
        match variant {
            ModelVariant::NoiseOnly => &self.noise,
            ModelVariant::Full => &self.full,
        }
    }

    /// Fresh readers for the run directory of `variant`, for on-demand access
    /// to traces and marginal distributions.
    pub fn results(&self, config: &PipelineConfig, variant: ModelVariant) -> VariantResults {
        VariantResults::new(&StarLayout::from_config(config, &self.star_id).run(variant))
    }
}

/// Execute the full sampler workflow for one star.
///
/// Any fatal error (input I/O, launch failure, exhausted retries, cancellation,
/// missing summary/evidence) aborts the star; no partial analysis is returned.
/// A failing variant cancels the other one at its next poll.
pub fn analyze_star(
    request: &RunRequest,
    config: &PipelineConfig,
    launcher: &dyn ProcessLauncher,
    cancel: &CancelToken,
) -> Result<StarAnalysis> {
    config.validate()?;

    // 1) Inputs (also creates both run directories).
    let layout = InputWriter::new(config).write(request)?;

    // 2) Both variants touch disjoint run directories, so they run side by side.
    // The first fatal error cancels the sibling through a star-scoped token.
    let star_cancel = cancel.child();
    let run = |variant: ModelVariant| {
        let result = analyze_variant(request, config, &layout, launcher, &star_cancel, variant);
        if let Err(e) = &result {
            warn!(star_id = request.star_id(), %variant, error = %e, "variant failed, aborting star");
            star_cancel.cancel();
        }
        result
    };
    let (noise, full) = rayon::join(|| run(ModelVariant::NoiseOnly), || run(ModelVariant::Full));

    let (noise, full) = match (noise, full) {
        (Ok(noise), Ok(full)) => (noise, full),
        // Report the failure that triggered the abort, not the sibling's cancellation.
        (Err(PipelineError::Cancelled { .. }), Err(e)) | (Err(e), _) | (_, Err(e)) => return Err(e),
    };

    // 3) Model comparison.
    let comparison = compare_models(&full.evidence, &noise.evidence);
    info!(
        star_id = request.star_id(),
        ln_k = comparison.log_bayes_factor,
        strength = %comparison.strength,
        preferred = %comparison.preferred,
        "model comparison"
    );

    Ok(StarAnalysis {
        star_id: request.star_id().to_string(),
        nyquist: request.nyquist(),
        noise,
        full,
        comparison,
    })
}

fn analyze_variant(
    request: &RunRequest,
    config: &PipelineConfig,
    layout: &StarLayout,
    launcher: &dyn ProcessLauncher,
    cancel: &CancelToken,
    variant: ModelVariant,
) -> Result<VariantAnalysis> {
    let command = SamplerCommand::for_variant(config, layout, variant);
    let report = Orchestrator::new(config, launcher, cancel).run(request.star_id(), variant, &command)?;

    let results = VariantResults::new(&command.run);
    let summary = results.summary.get()?.clone();
    let evidence = *results.evidence.get()?;
    let priors = match results.priors.get() {
        Ok(priors) => Some(priors.clone()),
        Err(e) => {
            warn!(star_id = request.star_id(), %variant, error = %e, "priors unavailable");
            None
        }
    };
    let background = reconstruct(&summary, request.nyquist(), variant, &request.frequencies())?;

    Ok(VariantAnalysis {
        report,
        summary,
        evidence,
        priors,
        background,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PRIOR_COUNT, PriorBound, RunStatus};
    use crate::sampler::{ScriptedAttempt, ScriptedLauncher, ScriptedOutputs};

    fn request() -> RunRequest {
        let spectrum = (1..=200).map(|i| (i as f64, 100.0 / i as f64)).collect();
        let priors: [PriorBound; PRIOR_COUNT] = [PriorBound::new(0.5, 5.0); PRIOR_COUNT];
        RunRequest::new("KIC100", spectrum, 283.2, priors).unwrap()
    }

    fn config(root: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            results_root: root.to_path_buf(),
            max_attempts: 2,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn analyzes_both_variants() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let launcher = ScriptedLauncher::new()
            .script(
                ModelVariant::NoiseOnly,
                [ScriptedAttempt::good(ScriptedOutputs::for_variant(ModelVariant::NoiseOnly, -2000.0))],
            )
            .script(
                ModelVariant::Full,
                [
                    ScriptedAttempt::failing("Quitting"),
                    ScriptedAttempt::good(ScriptedOutputs::for_variant(ModelVariant::Full, -1990.0)),
                ],
            );

        let analysis = analyze_star(&request(), &config, &launcher, &CancelToken::new()).unwrap();
        assert_eq!(analysis.noise.summary.len(), 7);
        assert_eq!(analysis.full.summary.len(), 10);
        assert_eq!(analysis.full.report.attempts.len(), 2);
        assert_eq!(analysis.full.report.status, RunStatus::Good);
        assert_eq!(analysis.full.background.len(), 200);
        assert!(analysis.noise.background.oscillation.is_none());
        assert!(analysis.full.priors.is_some());
        assert_eq!(analysis.comparison.preferred, ModelVariant::Full);
        assert_eq!(analysis.variant(ModelVariant::Full).evidence.log_evidence, -1990.0);
    }

    #[test]
    fn exhausted_variant_aborts_the_star() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let launcher = ScriptedLauncher::new()
            .script(
                ModelVariant::NoiseOnly,
                [ScriptedAttempt::good(ScriptedOutputs::for_variant(ModelVariant::NoiseOnly, -2000.0))],
            )
            .script(
                ModelVariant::Full,
                [ScriptedAttempt::silent(), ScriptedAttempt::silent()],
            );

        let err = analyze_star(&request(), &config, &launcher, &CancelToken::new()).unwrap_err();
        match err {
            PipelineError::RunExhausted { star_id, variant, attempts } => {
                assert_eq!(star_id, "KIC100");
                assert_eq!(variant, ModelVariant::Full);
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failing_variant_stops_its_sibling() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            max_attempts: 3,
            attempt_timeout: std::time::Duration::from_secs(2),
            ..config(tmp.path())
        };
        // NoiseOnly has nothing scripted, so its launch fails at once.
        let launcher = ScriptedLauncher::new().script(
            ModelVariant::Full,
            [ScriptedAttempt::stalled(), ScriptedAttempt::stalled(), ScriptedAttempt::stalled()],
        );
        let cancel = CancelToken::new();

        let start = std::time::Instant::now();
        let err = analyze_star(&request(), &config, &launcher, &cancel).unwrap_err();

        assert!(matches!(err, PipelineError::Launch { .. }), "unexpected error: {err}");
        assert!(start.elapsed() < config.attempt_timeout);
        assert!(launcher.launches(ModelVariant::Full) <= 1);
        assert!(!cancel.is_cancelled());
    }
}
