//! Scripted sampler for offline runs and tests.
//!
//! Each variant gets a queue of [`ScriptedAttempt`]s. Every launch pops the
//! next attempt, replays its diagnostic lines and, when the attempt carries
//! outputs, writes sampler-shaped result files into the run directory as the
//! process "exits".

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::domain::{ModelVariant, ParameterName};
use crate::error::{PipelineError, Result};
use crate::io::layout::RunLayout;
use crate::io::table::write_table;
use crate::sampler::command::SamplerCommand;
use crate::sampler::launcher::{ProcessExit, ProcessLauncher, SamplerProcess, StreamEvent};

/// Medians used by [`ScriptedOutputs::for_variant`], in file order.
pub const DEFAULT_MEDIANS: [f64; 10] = [1.2, 30.0, 2.0, 50.0, 30.0, 40.0, 90.0, 5.0, 120.0, 10.0];

/// Result files a scripted attempt leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedOutputs {
    /// Rows of `mean, median, mode, variance, lower, upper, skew`.
    pub summary: Vec<[f64; 7]>,
    /// `log_evidence, log_evidence_error, information_gain`.
    pub evidence: [f64; 3],
    /// Also write traces and marginal distributions.
    pub diagnostics: bool,
}

impl ScriptedOutputs {
    /// Plausible outputs for `variant` with the given log evidence.
    pub fn for_variant(variant: ModelVariant, log_evidence: f64) -> Self {
        let summary = DEFAULT_MEDIANS[..variant.param_count()]
            .iter()
            .map(|&m| {
                let sd = 0.05 * m;
                [m * 1.01, m, m * 0.99, sd * sd, m - sd, m + 1.2 * sd, 0.1]
            })
            .collect();
        Self {
            summary,
            evidence: [log_evidence, 0.15, 12.0],
            diagnostics: false,
        }
    }

    pub fn with_diagnostics(mut self) -> Self {
        self.diagnostics = true;
        self
    }

    fn write(&self, run: &RunLayout) -> Result<()> {
        write_table(&run.summary_file(), &self.summary)?;
        write_table(&run.evidence_file(), [self.evidence])?;
        if !self.diagnostics {
            return Ok(());
        }

        for (name, row) in ParameterName::ALL.iter().zip(&self.summary) {
            let (median, sd) = (row[1], row[3].sqrt());
            let trace = (0..100).map(|i| [median + sd * ((i as f64) * 0.7).sin()]);
            write_table(&run.trace_file(*name), trace)?;

            let marginal = (0..50).map(|i| {
                let x = median - 3.0 * sd + 6.0 * sd * i as f64 / 49.0;
                let z = (x - median) / sd;
                [x, (-0.5 * z * z).exp()]
            });
            write_table(&run.marginal_file(*name), marginal)?;
        }
        Ok(())
    }
}

/// One canned sampler launch.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedAttempt {
    pub lines: Vec<String>,
    pub outputs: Option<ScriptedOutputs>,
    pub exit_code: Option<i32>,
    /// Never close the stream; the attempt only ends by deadline or kill.
    pub stall: bool,
    /// Close the stream but never exit.
    pub linger: bool,
}

impl ScriptedAttempt {
    pub fn good(outputs: ScriptedOutputs) -> Self {
        Self {
            lines: vec!["Nested sampling finished.".to_string()],
            outputs: Some(outputs),
            exit_code: Some(0),
            stall: false,
            linger: false,
        }
    }

    /// Prints `line` and exits without writing results.
    pub fn failing(line: &str) -> Self {
        Self {
            lines: vec![line.to_string()],
            outputs: None,
            exit_code: Some(134),
            stall: false,
            linger: false,
        }
    }

    /// Exits cleanly without printing anything or writing results.
    pub fn silent() -> Self {
        Self {
            lines: Vec::new(),
            outputs: None,
            exit_code: Some(0),
            stall: false,
            linger: false,
        }
    }

    pub fn stalled() -> Self {
        Self {
            lines: Vec::new(),
            outputs: None,
            exit_code: None,
            stall: true,
            linger: false,
        }
    }

    pub fn lingering() -> Self {
        Self {
            lines: Vec::new(),
            outputs: None,
            exit_code: None,
            stall: false,
            linger: true,
        }
    }

    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = lines.into_iter().map(Into::into).collect();
        self
    }
}

/// A [`ProcessLauncher`] replaying per-variant scripts.
#[derive(Debug, Default)]
pub struct ScriptedLauncher {
    scripts: Mutex<HashMap<ModelVariant, VecDeque<ScriptedAttempt>>>,
    launched: Mutex<Vec<SamplerCommand>>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `attempts` for `variant`, after anything already queued.
    pub fn script(self, variant: ModelVariant, attempts: impl IntoIterator<Item = ScriptedAttempt>) -> Self {
        self.scripts
            .lock()
            .entry(variant)
            .or_default()
            .extend(attempts);
        self
    }

    /// Number of launches performed for `variant` so far.
    pub fn launches(&self, variant: ModelVariant) -> usize {
        self.launched
            .lock()
            .iter()
            .filter(|c| c.variant() == variant)
            .count()
    }

    pub fn commands(&self) -> Vec<SamplerCommand> {
        self.launched.lock().clone()
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch(&self, command: &SamplerCommand) -> Result<Box<dyn SamplerProcess>> {
        let attempt = self
            .scripts
            .lock()
            .get_mut(&command.variant())
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| PipelineError::Launch {
                program: command.program.clone(),
                source: std::io::Error::other(format!(
                    "no scripted attempt left for {}",
                    command.variant()
                )),
            })?;
        self.launched.lock().push(command.clone());

        Ok(Box::new(ScriptedProcess {
            lines: attempt.lines.into(),
            outputs: attempt.outputs,
            exit_code: attempt.exit_code,
            stall: attempt.stall,
            linger: attempt.linger,
            run: command.run.clone(),
        }))
    }
}

struct ScriptedProcess {
    lines: VecDeque<String>,
    outputs: Option<ScriptedOutputs>,
    exit_code: Option<i32>,
    stall: bool,
    linger: bool,
    run: RunLayout,
}

impl SamplerProcess for ScriptedProcess {
    fn next_event(&mut self, until: Instant) -> Result<StreamEvent> {
        if let Some(line) = self.lines.pop_front() {
            return Ok(StreamEvent::Line(line));
        }
        if self.stall {
            let now = Instant::now();
            std::thread::sleep(until.saturating_duration_since(now).min(Duration::from_millis(20)));
            return Ok(StreamEvent::Idle);
        }
        Ok(StreamEvent::Closed)
    }

    fn wait(&mut self, until: Instant) -> Result<ProcessExit> {
        if self.linger {
            std::thread::sleep(until.saturating_duration_since(Instant::now()));
            return Ok(ProcessExit::StillRunning);
        }
        if let Some(outputs) = self.outputs.take() {
            outputs.write(&self.run)?;
        }
        Ok(ProcessExit::Exited(self.exit_code))
    }

    fn kill(&mut self) {
        self.lines.clear();
        self.outputs = None;
        self.stall = false;
        self.linger = false;
    }
}
