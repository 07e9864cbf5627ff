//! External tool invocation
//!
//! [`ToolRunner`] is the single blocking call the driver depends on. The real
//! implementation, [`ProcessRunner`], spawns a child process and measures the
//! wall-clock time from just before the spawn until the child has exited.

use crate::error::InvocationError;
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Outcome of one completed tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Exit code, `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

impl Invocation {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Lossy, trimmed stderr for error messages
    pub fn stderr_excerpt(&self, max_chars: usize) -> String {
        let text = String::from_utf8_lossy(&self.stderr);
        let text = text.trim();
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let tail: String = text.chars().skip(text.chars().count() - max_chars).collect();
            format!("...{}", tail)
        }
    }
}

/// Runs the benchmarked executable once per call
pub trait ToolRunner {
    /// Executable name or path, for messages
    fn executable(&self) -> &str;

    /// Run to completion with `args`, capturing output and elapsed time.
    ///
    /// A non-zero exit is still `Ok`; only failing to run (or to finish in
    /// time) is an error.
    fn run(&mut self, args: &[String]) -> Result<Invocation, InvocationError>;
}

/// [`ToolRunner`] backed by `std::process::Command`
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    executable: String,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            timeout: None,
        }
    }

    /// Kill the child and fail when it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn spawn(&self, args: &[String]) -> Result<Child, InvocationError> {
        Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    InvocationError::NotFound {
                        executable: self.executable.clone(),
                    }
                } else {
                    InvocationError::Launch {
                        executable: self.executable.clone(),
                        source: e,
                    }
                }
            })
    }

    fn io_error(&self, source: io::Error) -> InvocationError {
        InvocationError::Io {
            executable: self.executable.clone(),
            source,
        }
    }

    fn timed_out(&self, timeout: Duration) -> InvocationError {
        InvocationError::Timeout {
            executable: self.executable.clone(),
            timeout,
        }
    }

    fn wait_with_deadline(
        &self,
        mut child: Child,
        start: Instant,
        timeout: Duration,
    ) -> Result<(ExitStatus, Vec<u8>, Vec<u8>, Duration), InvocationError> {
        // drain both pipes so a chatty child cannot block on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match child.wait_timeout(timeout.saturating_sub(start.elapsed())) {
            Ok(Some(status)) => status,
            Ok(None) => {
                warn!(executable = %self.executable, ?timeout, "Killing tool after timeout");
                if let Err(e) = child.kill() {
                    debug!(error = %e, "Kill after timeout failed");
                }
                let _ = child.wait();
                return Err(self.timed_out(timeout));
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let elapsed = start.elapsed();

        // a background grandchild may still hold the pipes open
        let deadline = start + timeout;
        let stdout = self.collect(stdout, deadline, timeout)?;
        let stderr = self.collect(stderr, deadline, timeout)?;
        Ok((status, stdout, stderr, elapsed))
    }

    fn collect(
        &self,
        pipe: Option<Receiver<io::Result<Vec<u8>>>>,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<Vec<u8>, InvocationError> {
        let Some(pipe) = pipe else {
            return Ok(Vec::new());
        };
        match pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => result.map_err(|e| self.io_error(e)),
            Err(RecvTimeoutError::Timeout) => {
                warn!(executable = %self.executable, ?timeout, "Tool output still open after timeout");
                Err(self.timed_out(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(self.io_error(io::Error::other("pipe reader thread panicked")))
            }
        }
    }
}

impl ToolRunner for ProcessRunner {
    fn executable(&self) -> &str {
        &self.executable
    }

    fn run(&mut self, args: &[String]) -> Result<Invocation, InvocationError> {
        debug!(executable = %self.executable, ?args, "Invoking tool");

        let start = Instant::now();
        let child = self.spawn(args)?;
        let (status, stdout, stderr, elapsed) = match self.timeout {
            Some(timeout) => self.wait_with_deadline(child, start, timeout)?,
            None => {
                let output = child.wait_with_output().map_err(|e| self.io_error(e))?;
                let elapsed = start.elapsed();
                (output.status, output.stdout, output.stderr, elapsed)
            }
        };

        Ok(Invocation {
            exit_code: status.code(),
            stdout,
            stderr,
            elapsed,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<io::Result<Vec<u8>>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let result = pipe.read_to_end(&mut buffer).map(|_| buffer);
        let _ = sender.send(result);
    });
    receiver
}
