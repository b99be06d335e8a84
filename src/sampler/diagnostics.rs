//! Classification of the sampler's diagnostic output.
//!
//! The sampler reports trouble only as free text on stdout/stderr. Each line is
//! matched against an ordered table of substrings; the first rule that matches
//! decides the failure status. Keeping the table as data lets tests (and
//! callers with a patched sampler) substitute their own rules.

use crate::domain::RunStatus;

/// One `(substring, status)` classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticRule {
    pub pattern: &'static str,
    pub status: RunStatus,
}

const fn rule(pattern: &'static str, status: RunStatus) -> DiagnosticRule {
    DiagnosticRule { pattern, status }
}

/// Rules in priority order.
///
/// Several crash signatures all map to `MatrixDecompositionFailure`: the sampler
/// aborts the same way whether the decomposition or something after it fails,
/// so they are not told apart.
pub const DIAGNOSTIC_RULES: &[DiagnosticRule] = &[
    rule("Cannot compute likelihood", RunStatus::LikelihoodFailure),
    rule("Covariance matrix is not positive definite", RunStatus::CovarianceFailure),
    rule("Assertion", RunStatus::AssertionFailure),
    rule("Matrix decomposition failed", RunStatus::MatrixDecompositionFailure),
    rule("core dumped", RunStatus::MatrixDecompositionFailure),
    rule("Aborted", RunStatus::MatrixDecompositionFailure),
    rule("Quitting", RunStatus::MatrixDecompositionFailure),
    rule("Segmentation fault", RunStatus::MatrixDecompositionFailure),
];

/// Classify `line` with the default rule table.
pub fn classify_line(line: &str) -> Option<RunStatus> {
    classify_with(DIAGNOSTIC_RULES, line)
}

/// Status of the first rule whose pattern occurs in `line`.
pub fn classify_with(rules: &[DiagnosticRule], line: &str) -> Option<RunStatus> {
    rules
        .iter()
        .find(|r| line.contains(r.pattern))
        .map(|r| r.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_progress_lines_do_not_match() {
        assert_eq!(classify_line("Nit: 1500   Ncl: 2   Nlive: 500   Ln(L_max): -12345.6"), None);
        assert_eq!(classify_line(""), None);
    }

    #[test]
    fn each_failure_family_is_recognized() {
        assert_eq!(
            classify_line("Error: Cannot compute likelihood for live point 12"),
            Some(RunStatus::LikelihoodFailure)
        );
        assert_eq!(
            classify_line("Covariance matrix is not positive definite."),
            Some(RunStatus::CovarianceFailure)
        );
        assert_eq!(
            classify_line("background: Ellipsoid.cpp:87: Assertion `n > 0' failed."),
            Some(RunStatus::AssertionFailure)
        );
        for line in [
            "Matrix decomposition failed",
            "Aborted (core dumped)",
            "Quitting program.",
            "Segmentation fault",
        ] {
            assert_eq!(classify_line(line), Some(RunStatus::MatrixDecompositionFailure), "{line}");
        }
    }

    #[test]
    fn earlier_rules_win() {
        let line = "Assertion failed, Quitting";
        assert_eq!(classify_line(line), Some(RunStatus::AssertionFailure));
    }

    #[test]
    fn custom_tables_are_honored() {
        let rules = [rule("boom", RunStatus::CovarianceFailure)];
        assert_eq!(classify_with(&rules, "kaboom!"), Some(RunStatus::CovarianceFailure));
        assert_eq!(classify_with(&rules, "Segmentation fault"), None);
    }
}
