//! Process launching.
//!
//! The orchestrator never touches `std::process` directly. It talks to a
//! [`ProcessLauncher`], which hands back a [`SamplerProcess`] yielding the
//! merged diagnostic stream line by line. [`SystemLauncher`] spawns the real
//! binary; [`ScriptedLauncher`](crate::sampler::ScriptedLauncher) replays
//! canned attempts for offline runs and tests.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::sampler::command::SamplerCommand;

/// Sleep between exit checks while reaping a process.
const REAP_POLL: Duration = Duration::from_millis(10);

/// What happened while waiting for diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Line(String),
    /// Nothing arrived before the requested instant.
    Idle,
    /// Every output stream reached end of file.
    Closed,
}

/// Result of waiting for a process to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Reaped; carries the exit code if the platform reports one.
    Exited(Option<i32>),
    StillRunning,
}

pub trait SamplerProcess: Send {
    /// Wait until `until` for the next diagnostic line.
    fn next_event(&mut self, until: Instant) -> Result<StreamEvent>;

    /// Wait until `until` for the process to exit after its streams closed.
    fn wait(&mut self, until: Instant) -> Result<ProcessExit>;

    /// Terminate and reap the process. Never fails; a process that already
    /// exited is left alone.
    fn kill(&mut self);
}

pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, command: &SamplerCommand) -> Result<Box<dyn SamplerProcess>>;
}

/// Shared cancellation flag, polled while an attempt waits on the sampler.
///
/// A [`child`](CancelToken::child) token is cancelled together with its
/// parent but can also be cancelled on its own without touching the parent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token scoped to one unit of work below `self`.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}

/// Spawns the sampler binary with piped stdout/stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, command: &SamplerCommand) -> Result<Box<dyn SamplerProcess>> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::Launch {
                program: command.program.clone(),
                source: e,
            })?;

        debug!(pid = child.id(), command = %command, "spawned sampler");

        // One reader thread per pipe; both feed the same channel so lines are
        // classified in arrival order regardless of which stream they came from.
        let (tx, rx) = channel::unbounded();
        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(spawn_reader(out, tx.clone()));
        }
        if let Some(err) = child.stderr.take() {
            readers.push(spawn_reader(err, tx.clone()));
        }
        drop(tx);

        Ok(Box::new(SystemProcess {
            child,
            lines: rx,
            readers,
            reaped: false,
        }))
    }
}

fn spawn_reader<R>(stream: R, tx: Sender<String>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to read sampler output");
                    break;
                }
            }
        }
    })
}

struct SystemProcess {
    child: Child,
    lines: Receiver<String>,
    readers: Vec<JoinHandle<()>>,
    reaped: bool,
}

impl SamplerProcess for SystemProcess {
    fn next_event(&mut self, until: Instant) -> Result<StreamEvent> {
        match self.lines.recv_deadline(until) {
            Ok(line) => Ok(StreamEvent::Line(line)),
            Err(RecvTimeoutError::Timeout) => Ok(StreamEvent::Idle),
            Err(RecvTimeoutError::Disconnected) => Ok(StreamEvent::Closed),
        }
    }

    fn wait(&mut self, until: Instant) -> Result<ProcessExit> {
        loop {
            let polled = self
                .child
                .try_wait()
                .map_err(|e| PipelineError::io(format!("<sampler pid {}>", self.child.id()), e))?;
            if let Some(status) = polled {
                self.reaped = true;
                for reader in self.readers.drain(..) {
                    let _ = reader.join();
                }
                return Ok(ProcessExit::Exited(status.code()));
            }

            let remaining = until.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(ProcessExit::StillRunning);
            }
            std::thread::sleep(remaining.min(REAP_POLL));
        }
    }

    fn kill(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = self.child.kill() {
            debug!(error = %e, "sampler already exited before kill");
        }
        let _ = self.child.wait();
        self.reaped = true;
        // Reader threads finish on their own once the pipes close; a stalled
        // grandchild holding a pipe must not block us here.
        self.readers.clear();
    }
}

impl Drop for SystemProcess {
    fn drop(&mut self) {
        self.kill();
    }
}
