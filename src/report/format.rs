//! Plain-text summary of a finished star analysis.
//!
//! Layout: header, one block per variant (attempt history, evidence,
//! parameter table), then the Bayes-factor line.

use crate::app::pipeline::{StarAnalysis, VariantAnalysis};
use crate::compare::BayesComparison;

/// Format the full star summary (run status, parameters, comparison).
pub fn format_star_summary(analysis: &StarAnalysis) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== bgfit - {} ===\n", analysis.star_id));
    out.push_str(&format!("Nyquist: {:.4} uHz\n", analysis.nyquist));

    for variant in [&analysis.noise, &analysis.full] {
        out.push('\n');
        out.push_str(&format_variant(variant));
    }

    out.push('\n');
    out.push_str(&format_comparison(&analysis.comparison));
    out
}

/// Status line plus one row per fitted parameter.
pub fn format_variant(v: &VariantAnalysis) -> String {
    let mut out = String::new();
    let report = &v.report;
    out.push_str(&format!(
        "{} ({} attempt{}): {}\n",
        report.variant,
        report.attempts.len(),
        if report.attempts.len() == 1 { "" } else { "s" },
        report.status
    ));
    for a in report.attempts.iter().filter(|a| a.status.is_failure()) {
        out.push_str(&format!(
            "  attempt {}: {}{}\n",
            a.attempt,
            a.status,
            a.matched_line
                .as_deref()
                .map(|l| format!(" ({l})"))
                .unwrap_or_default()
        ));
    }

    out.push_str(&format!("  ln Z = {}\n", v.evidence.uncertain()));
    out.push_str(&format!(
        "  {:<14} {:>14} {:>12} {:>14}\n",
        "parameter", "median", "error", "prior"
    ));
    for (name, stats) in v.summary.iter() {
        let u = stats.uncertain();
        let prior = v
            .priors
            .as_ref()
            .and_then(|p| p.get(name))
            .map(|b| format!("[{:.3}, {:.3}]", b.lower, b.upper))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<14} {:>14.4} {:>12.4} {:>14}\n",
            name.key(),
            u.value,
            u.error,
            prior
        ));
    }
    out
}

pub fn format_comparison(c: &BayesComparison) -> String {
    format!(
        "Bayes factor: ln K = {:.4} ({} evidence, prefers {})\n",
        c.log_bayes_factor, c.strength, c.preferred
    )
}
