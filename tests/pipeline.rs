use bgfit::compare::EvidenceStrength;
use bgfit::domain::{ModelVariant, ParameterName, PipelineConfig, PriorBound, RunRequest, RunStatus};
use bgfit::io::{read_analysis_json, write_analysis_json};
use bgfit::report::format_star_summary;
use bgfit::results::CredibleLimits;
use bgfit::sampler::{CancelToken, ScriptedAttempt, ScriptedLauncher, ScriptedOutputs};
use bgfit::{PipelineError, analyze_star};

fn request(star_id: &str) -> RunRequest {
    let spectrum = (1..=1000)
        .map(|i| {
            let f = i as f64 * 0.28;
            (f, 5.0 + 800.0 / (1.0 + (f / 30.0).powi(4)))
        })
        .collect();
    let priors = [
        PriorBound::new(0.5, 5.0),
        PriorBound::new(0.6, 3.0e3),
        PriorBound::new(0.1, 20.0),
        PriorBound::new(0.6, 3.0e3),
        PriorBound::new(10.0, 90.0),
        PriorBound::new(0.6, 3.0e3),
        PriorBound::new(20.0, 150.0),
        PriorBound::new(0.1, 50.0),
        PriorBound::new(80.0, 160.0),
        PriorBound::new(2.0, 30.0),
    ];
    RunRequest::new(star_id, spectrum, 283.2, priors).unwrap()
}

fn config(root: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        results_root: root.to_path_buf(),
        max_attempts: 3,
        ..PipelineConfig::default()
    }
}

#[test]
fn end_to_end_star_analysis() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config(tmp.path());
    let launcher = ScriptedLauncher::new()
        .script(
            ModelVariant::NoiseOnly,
            [ScriptedAttempt::good(
                ScriptedOutputs::for_variant(ModelVariant::NoiseOnly, -2010.0).with_diagnostics(),
            )],
        )
        .script(
            ModelVariant::Full,
            [
                ScriptedAttempt::failing("Covariance matrix is not positive definite"),
                ScriptedAttempt::good(ScriptedOutputs::for_variant(ModelVariant::Full, -2000.0).with_diagnostics()),
            ],
        );

    let analysis = analyze_star(&request("KIC012008916"), &config, &launcher, &CancelToken::new()).unwrap();

    assert_eq!(analysis.noise.report.status, RunStatus::Good);
    assert_eq!(analysis.full.report.status, RunStatus::Good);
    assert_eq!(analysis.full.report.attempts[0].status, RunStatus::CovarianceFailure);
    assert_eq!(launcher.launches(ModelVariant::Full), 2);

    assert_eq!(analysis.full.evidence.log_evidence, -2000.0);
    assert!((analysis.comparison.log_bayes_factor - 10.0).abs() < 1e-12);
    assert_eq!(analysis.comparison.strength, EvidenceStrength::Strong);
    assert_eq!(analysis.comparison.preferred, ModelVariant::Full);

    let nu_max = analysis.full.summary.get(ParameterName::NuMax).unwrap();
    assert_eq!(nu_max.median, 120.0);
    assert_eq!(analysis.full.background.len(), 1000);
    assert!(analysis.full.background.total().iter().all(|v| v.is_finite() && *v > 0.0));

    // On-demand diagnostics from the run directory.
    let results = analysis.results(&config, ModelVariant::Full);
    assert_eq!(results.traces.get(ParameterName::NuMax).unwrap().len(), 100);
    let limits = CredibleLimits::from(nu_max);
    let shaded = results.marginals.shaded(ParameterName::NuMax, limits).unwrap();
    assert!(shaded.mask.iter().any(|&m| m));
    assert!(shaded.mask.iter().any(|&m| !m));

    let text = format_star_summary(&analysis);
    assert!(text.contains("KIC012008916"));
    assert!(text.contains("nu_max"));
    assert!(text.contains("strong evidence"));

    let json = tmp.path().join("analysis.json");
    write_analysis_json(&json, &analysis).unwrap();
    let back = read_analysis_json(&json).unwrap();
    assert_eq!(back.star_id, analysis.star_id);
    assert_eq!(back.comparison, analysis.comparison);
    assert_eq!(back.full.summary, analysis.full.summary);
}

#[test]
fn validating_existing_outputs_without_launching() {
    let tmp = tempfile::tempdir().unwrap();
    let first = ScriptedLauncher::new()
        .script(
            ModelVariant::NoiseOnly,
            [ScriptedAttempt::good(ScriptedOutputs::for_variant(ModelVariant::NoiseOnly, -50.0))],
        )
        .script(
            ModelVariant::Full,
            [ScriptedAttempt::good(ScriptedOutputs::for_variant(ModelVariant::Full, -50.5))],
        );
    analyze_star(&request("KIC1"), &config(tmp.path()), &first, &CancelToken::new()).unwrap();

    let offline = PipelineConfig {
        run_sampler: false,
        ..config(tmp.path())
    };
    let idle = ScriptedLauncher::new();
    let analysis = analyze_star(&request("KIC1"), &offline, &idle, &CancelToken::new()).unwrap();

    assert_eq!(idle.launches(ModelVariant::NoiseOnly), 0);
    assert_eq!(idle.launches(ModelVariant::Full), 0);
    assert!(analysis.full.report.attempts.is_empty());
    // ln K = -0.5 sits below ln 1.
    assert_eq!(analysis.comparison.strength, EvidenceStrength::Inconclusive);
    assert_eq!(analysis.comparison.preferred, ModelVariant::NoiseOnly);
}

#[test]
fn cancelled_star_reports_cancellation() {
    let tmp = tempfile::tempdir().unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let launcher = ScriptedLauncher::new()
        .script(ModelVariant::NoiseOnly, [ScriptedAttempt::stalled()])
        .script(ModelVariant::Full, [ScriptedAttempt::stalled()]);

    let err = analyze_star(&request("KIC2"), &config(tmp.path()), &launcher, &cancel).unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled { .. }), "unexpected error: {err}");
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn nan_statistic_survives_json_export() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config(tmp.path());
    let mut noise = ScriptedOutputs::for_variant(ModelVariant::NoiseOnly, -120.0);
    noise.summary[0][6] = f64::NAN;
    let launcher = ScriptedLauncher::new()
        .script(ModelVariant::NoiseOnly, [ScriptedAttempt::good(noise)])
        .script(
            ModelVariant::Full,
            [ScriptedAttempt::good(ScriptedOutputs::for_variant(ModelVariant::Full, -118.0))],
        );

    let analysis = analyze_star(&request("KIC3"), &config, &launcher, &CancelToken::new()).unwrap();
    assert!(analysis.noise.summary.get(ParameterName::WhiteNoise).unwrap().skewness.is_nan());

    let json = tmp.path().join("KIC3.json");
    write_analysis_json(&json, &analysis).unwrap();
    let back = read_analysis_json(&json).unwrap();

    let w = back.noise.summary.get(ParameterName::WhiteNoise).unwrap();
    assert!(w.skewness.is_nan());
    assert_eq!(w.median, 1.2);
    assert_eq!(back.full.summary, analysis.full.summary);
    assert_eq!(back.comparison, analysis.comparison);
}
