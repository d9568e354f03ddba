//! Post-install smoke test.
//!
//! Runs the installed binary with the descriptor's test arguments and checks
//! that its output contains the expected text. The child is killed if it does
//! not exit within the timeout. Output is collected for at most
//! [`OUTPUT_GRACE`] after the child exits, so a background process that keeps
//! the pipes open cannot stall the test.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use wait_timeout::ChildExt;

/// Default time a smoke test may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long output is still read once the binary has exited.
pub const OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// Errors raised by a failed smoke test.
#[derive(Error, Debug)]
pub enum SmokeTestError {
    /// The binary could not be started.
    #[error("failed to run {binary}: {source}")]
    Spawn {
        /// Binary that was run.
        binary: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The binary did not exit in time and was killed.
    #[error("smoke test timed out after {secs}s")]
    Timeout {
        /// Timeout that elapsed.
        secs: u64,
    },

    /// The binary exited unsuccessfully.
    #[error("smoke test exited with {status}: {output}")]
    ExitStatus {
        /// Rendered exit status.
        status: String,
        /// Captured output.
        output: String,
    },

    /// The output did not contain the expected text.
    #[error("smoke test output does not contain '{expected}': {output}")]
    MissingOutput {
        /// Text that was expected.
        expected: String,
        /// Captured output.
        output: String,
    },
}

/// Captured output of a passing smoke test.
#[derive(Debug, Clone)]
pub struct SmokeReport {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

/// Run `binary` with `args` and require `expect` in its output.
///
/// Standard output is searched first, then standard error, since some tools
/// print usage to stderr.
///
/// # Errors
///
/// Returns a [`SmokeTestError`] describing why the test failed.
pub fn run_smoke_test(
    binary: &Path,
    args: &[String],
    expect: &str,
    timeout: Duration,
) -> Result<SmokeReport, SmokeTestError> {
    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| SmokeTestError::Spawn {
            binary: binary.display().to_string(),
            source,
        })?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            child.kill().ok();
            child.wait().ok();
            return Err(SmokeTestError::Timeout {
                secs: timeout.as_secs(),
            });
        }
        Err(source) => {
            child.kill().ok();
            return Err(SmokeTestError::Spawn {
                binary: binary.display().to_string(),
                source,
            });
        }
    };

    let deadline = Instant::now() + OUTPUT_GRACE;
    let stdout = stdout.map(|rx| collect(&rx, deadline)).unwrap_or_default();
    let stderr = stderr.map(|rx| collect(&rx, deadline)).unwrap_or_default();
    tracing::debug!(binary = %binary.display(), ?args, %status, "smoke test finished");

    if !status.success() {
        return Err(SmokeTestError::ExitStatus {
            status: status.to_string(),
            output: excerpt(&stdout, &stderr),
        });
    }

    if stdout.contains(expect) || stderr.contains(expect) {
        Ok(SmokeReport { stdout, stderr })
    } else {
        Err(SmokeTestError::MissingOutput {
            expected: expect.to_string(),
            output: excerpt(&stdout, &stderr),
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Read chunks until the pipe closes or `deadline` passes.
fn collect(rx: &Receiver<Vec<u8>>, deadline: Instant) -> String {
    let mut out = Vec::new();
    loop {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(chunk) => out.extend(chunk),
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!("smoke test output still open after exit, not waiting");
                out.extend(rx.try_iter().flatten());
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn excerpt(stdout: &str, stderr: &str) -> String {
    let text = if stdout.trim().is_empty() { stderr } else { stdout };
    let first = text.lines().next().unwrap_or("").trim();
    if first.is_empty() {
        "(no output)".to_string()
    } else {
        first.chars().take(200).collect()
    }
}
