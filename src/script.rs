//! External script execution.
//!
//! Handlers that delegate to host scripts (backup, password rotation, router
//! configuration) go through [`ScriptRunner`]. The contract is deliberately
//! lossy: a run returns the script's stdout on success and `None` on any
//! failure (spawn error, non-zero exit, timeout). Callers that need the
//! distinction report it as a domain failure; the dispatch core never sees a
//! raw process error.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Interval between completion checks while waiting on a child.
const POLL_INTERVAL_MS: u64 = 10;

/// Fallible synchronous script execution.
///
/// Implementations must be safe to share across concurrent dispatches.
pub trait ScriptRunner: Send + Sync {
    /// Run `script` with `args`, waiting at most `timeout_ms` if given.
    ///
    /// Returns the captured stdout, or `None` if the script could not be
    /// spawned, exited non-zero, or timed out.
    fn run(&self, script: &Path, args: &[String], timeout_ms: Option<u64>) -> Option<String>;
}

/// Result of waiting for a child process.
#[derive(Debug)]
enum WaitResult {
    Completed { exit_code: i32 },
    TimedOut,
}

/// [`ScriptRunner`] backed by `std::process::Command`.
#[derive(Debug, Default)]
pub struct ShellScriptRunner;

impl ScriptRunner for ShellScriptRunner {
    fn run(&self, script: &Path, args: &[String], timeout_ms: Option<u64>) -> Option<String> {
        let mut child = match Command::new(script)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(script = %script.display(), error = %e, "script spawn failed");
                return None;
            }
        };

        // Drain both pipes concurrently with the wait. A script whose output
        // exceeds the OS pipe buffer would otherwise block on write and never
        // exit, turning a successful run into a timeout.
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let result = wait_with_timeout(&mut child, timeout_ms);
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        match result {
            Ok(WaitResult::Completed { exit_code: 0 }) => {
                debug!(script = %script.display(), "script completed");
                Some(stdout)
            }
            Ok(WaitResult::Completed { exit_code }) => {
                warn!(
                    script = %script.display(),
                    exit_code,
                    stderr = %stderr.trim(),
                    "script exited non-zero"
                );
                None
            }
            Ok(WaitResult::TimedOut) => {
                warn!(
                    script = %script.display(),
                    timeout_ms = timeout_ms.unwrap_or(0),
                    "script timed out"
                );
                None
            }
            Err(e) => {
                warn!(script = %script.display(), error = %e, "script wait failed");
                None
            }
        }
    }
}

/// Read one pipe to a string on its own thread.
///
/// The thread finishes once the pipe closes, which happens when the child
/// exits or is killed.
fn spawn_reader<R>(pipe: Option<R>) -> std::thread::JoinHandle<String>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

/// Wait for a child process with optional timeout.
///
/// If `timeout_ms` is `Some` the process is killed once the deadline passes.
/// Handles EINTR by retrying the wait.
fn wait_with_timeout(child: &mut Child, timeout_ms: Option<u64>) -> std::io::Result<WaitResult> {
    let poll_interval = Duration::from_millis(POLL_INTERVAL_MS);
    let deadline = timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms));

    loop {
        match try_wait_with_eintr(child) {
            Ok(Some(status)) => {
                let exit_code = status.code().unwrap_or(-1);
                return Ok(WaitResult::Completed { exit_code });
            }
            Ok(None) => {
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Ok(WaitResult::TimedOut);
                    }
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Try to wait for a child process, handling EINTR by retrying.
fn try_wait_with_eintr(child: &mut Child) -> std::io::Result<Option<std::process::ExitStatus>> {
    loop {
        match child.try_wait() {
            Ok(status) => return Ok(status),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
