//! Supervised sampler runs with bounded retries.
//!
//! Per attempt, starting from `Running`:
//!
//! 1. launch the sampler and read its diagnostic lines until the streams close
//! 2. the first line matching a diagnostic rule fixes the failure status
//! 3. on exit, a still-`Running` attempt is `Good` if both mandatory output
//!    files exist, else `IncompleteOutput`
//! 4. an attempt that outlives its deadline is killed and marked `TimedOut`,
//!    including a process that closed its streams but never exits
//!
//! Attempts are strictly sequential and stop at the first `Good`. Running out
//! of attempts is fatal (`RunExhausted`); cancellation is fatal immediately.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::domain::{ModelVariant, PipelineConfig, RunStatus};
use crate::error::{PipelineError, Result};
use crate::sampler::command::SamplerCommand;
use crate::sampler::diagnostics::{DIAGNOSTIC_RULES, DiagnosticRule, classify_with};
use crate::sampler::launcher::{CancelToken, ProcessExit, ProcessLauncher, SamplerProcess, StreamEvent};

/// How long one wait on the diagnostic stream may block before the
/// cancellation flag and deadline are re-checked.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Outcome of one sampler launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt: usize,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub exit_code: Option<i32>,
    /// Diagnostic line that decided a failure status, if any.
    pub matched_line: Option<String>,
}

/// Final state of a `(star, variant)` run plus its attempt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub star_id: String,
    pub variant: ModelVariant,
    pub status: RunStatus,
    pub attempts: Vec<AttemptRecord>,
}

pub struct Orchestrator<'a> {
    config: &'a PipelineConfig,
    launcher: &'a dyn ProcessLauncher,
    cancel: &'a CancelToken,
    rules: &'a [DiagnosticRule],
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a PipelineConfig, launcher: &'a dyn ProcessLauncher, cancel: &'a CancelToken) -> Self {
        Self {
            config,
            launcher,
            cancel,
            rules: DIAGNOSTIC_RULES,
        }
    }

    /// Replace the diagnostic rule table.
    pub fn with_rules(mut self, rules: &'a [DiagnosticRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Drive `command` until a Good run or until attempts are exhausted.
    pub fn run(&self, star_id: &str, variant: ModelVariant, command: &SamplerCommand) -> Result<RunReport> {
        if command.variant() != variant {
            return Err(PipelineError::value(format!(
                "Command targets {} but {variant} was requested.",
                command.variant()
            )));
        }

        if !self.config.run_sampler {
            return self.validate_existing(star_id, variant, command);
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = Vec::with_capacity(max_attempts);

        for attempt in 1..=max_attempts {
            info!(star_id, %variant, attempt, max_attempts, "launching sampler");
            let record = self.attempt(star_id, variant, command, attempt)?;
            let status = record.status;
            attempts.push(record);

            if status.is_good() {
                info!(star_id, %variant, attempt, "sampler run good");
                return Ok(RunReport {
                    star_id: star_id.to_string(),
                    variant,
                    status,
                    attempts,
                });
            }
            warn!(star_id, %variant, attempt, %status, "sampler attempt failed");
        }

        error!(star_id, %variant, attempts = max_attempts, "sampler attempts exhausted");
        Err(PipelineError::RunExhausted {
            star_id: star_id.to_string(),
            variant,
            attempts: max_attempts,
        })
    }

    fn attempt(
        &self,
        star_id: &str,
        variant: ModelVariant,
        command: &SamplerCommand,
        attempt: usize,
    ) -> Result<AttemptRecord> {
        // Outputs left by an earlier attempt must not make this one look Good.
        for path in command.run.mandatory_outputs() {
            if path.exists() {
                std::fs::remove_file(&path).map_err(|e| PipelineError::io(&path, e))?;
            }
        }

        if self.cancel.is_cancelled() {
            warn!(star_id, %variant, attempt, "sampler run cancelled before launch");
            return Err(self.cancelled(star_id, variant));
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let deadline = start + self.config.attempt_timeout;

        let mut process = self.launcher.launch(command)?;
        let mut status = RunStatus::Running;
        let mut matched_line = None;

        loop {
            self.check_cancel(process.as_mut(), star_id, variant, attempt)?;

            let now = Instant::now();
            if now >= deadline {
                process.kill();
                warn!(star_id, %variant, attempt, timeout = ?self.config.attempt_timeout, "sampler attempt timed out");
                status = RunStatus::TimedOut;
                break;
            }

            match process.next_event(deadline.min(now + POLL_INTERVAL))? {
                StreamEvent::Line(line) => {
                    debug!(star_id, %variant, attempt, line = %line, "sampler");
                    if status == RunStatus::Running {
                        if let Some(failure) = classify_with(self.rules, &line) {
                            status = failure;
                            matched_line = Some(line);
                        }
                    }
                }
                StreamEvent::Idle => {}
                StreamEvent::Closed => break,
            }
        }

        let exit_code = if status == RunStatus::TimedOut {
            None
        } else {
            self.reap(process.as_mut(), star_id, variant, attempt, deadline, &mut status)?
        };

        if status == RunStatus::Running {
            let missing = command.run.missing_outputs();
            status = if missing.is_empty() {
                RunStatus::Good
            } else {
                warn!(star_id, %variant, attempt, ?missing, ?exit_code, "sampler exited without mandatory outputs");
                RunStatus::IncompleteOutput
            };
        }

        Ok(AttemptRecord {
            attempt,
            status,
            started_at,
            elapsed: start.elapsed(),
            exit_code,
            matched_line,
        })
    }

    /// Wait for the process to exit once its streams closed, still bounded by
    /// the attempt deadline and the cancellation flag.
    fn reap(
        &self,
        process: &mut dyn SamplerProcess,
        star_id: &str,
        variant: ModelVariant,
        attempt: usize,
        deadline: Instant,
        status: &mut RunStatus,
    ) -> Result<Option<i32>> {
        loop {
            self.check_cancel(process, star_id, variant, attempt)?;

            let now = Instant::now();
            if now >= deadline {
                process.kill();
                warn!(star_id, %variant, attempt, "sampler closed its streams but did not exit before the deadline");
                if *status == RunStatus::Running {
                    *status = RunStatus::TimedOut;
                }
                return Ok(None);
            }

            if let ProcessExit::Exited(code) = process.wait(deadline.min(now + POLL_INTERVAL))? {
                return Ok(code);
            }
        }
    }

    fn check_cancel(
        &self,
        process: &mut dyn SamplerProcess,
        star_id: &str,
        variant: ModelVariant,
        attempt: usize,
    ) -> Result<()> {
        if !self.cancel.is_cancelled() {
            return Ok(());
        }
        process.kill();
        warn!(star_id, %variant, attempt, "sampler run cancelled");
        Err(self.cancelled(star_id, variant))
    }

    fn cancelled(&self, star_id: &str, variant: ModelVariant) -> PipelineError {
        PipelineError::Cancelled {
            star_id: star_id.to_string(),
            variant,
        }
    }

    /// Reuse outputs of an earlier sampler run without launching anything.
    fn validate_existing(&self, star_id: &str, variant: ModelVariant, command: &SamplerCommand) -> Result<RunReport> {
        let missing = command.run.missing_outputs();
        if !missing.is_empty() {
            error!(star_id, %variant, ?missing, "sampler disabled and no previous outputs found");
            return Err(PipelineError::RunExhausted {
                star_id: star_id.to_string(),
                variant,
                attempts: 0,
            });
        }
        info!(star_id, %variant, "reusing existing sampler outputs");
        Ok(RunReport {
            star_id: star_id.to_string(),
            variant,
            status: RunStatus::Good,
            attempts: Vec::new(),
        })
    }
}
