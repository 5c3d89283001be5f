//! Execution Engine - Local Process Runner
//!
//! **Core Responsibility:**
//! Run the compiled solution against one fixture input and classify the outcome.
//!
//! **Critical Architectural Boundary:**
//! - Engine knows HOW to execute (spawn, redirect, time limit, kill)
//! - Engine does NOT compare outputs
//! - Engine does NOT touch the result log
//! - Engine writes raw stdout/stderr to files for the evaluator to judge

use crate::compiler::Executable;
use crate::error::SessionError;
use cpjudge_common::types::{OsKind, RunOutcome};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, instrument, warn};

/// Raw execution result for a single fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub outcome: RunOutcome,
    pub execution_time_ms: u64,
}

/// Process-based engine with a hard wall-clock limit
///
/// **Execution Rules:**
/// 1. Working directory is the fixture directory
/// 2. stdin is read from the input file
/// 3. stdout and stderr are written to files, created or truncated up front
/// 4. On timeout the process (its whole process group on Linux) is killed and
///    reaped before `run` returns; partial output stays on disk
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    timeout: Duration,
}

impl ProcessEngine {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Execute the solution against one input file
    ///
    /// ## Returns
    /// `ExecutionOutput` with `Success`, `RuntimeError` or `TimedOut`.
    /// Fails with `SessionError::Spawn` when the executable cannot be started and
    /// `SessionError::Io` when a redirect file cannot be opened.
    #[instrument(
        skip(self, executable),
        fields(program = %executable.program.display(), timeout_ms = self.timeout_ms(), os = %os)
    )]
    pub async fn run(
        &self,
        executable: &Executable,
        input_path: &Path,
        output_path: &Path,
        working_dir: &Path,
        stderr_path: &Path,
        os: OsKind,
    ) -> Result<ExecutionOutput, SessionError> {
        let stdin = open_std(tokio::fs::File::open(input_path).await, input_path).await?;
        let stdout = open_std(tokio::fs::File::create(output_path).await, output_path).await?;
        let stderr = open_std(tokio::fs::File::create(stderr_path).await, stderr_path).await?;

        let mut command = Command::new(&executable.program);
        command
            .args(&executable.args)
            .current_dir(working_dir)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);

        // Own process group so a timeout can take down grandchildren too
        #[cfg(unix)]
        if os == OsKind::Linux {
            command.process_group(0);
        }

        let start_time = Instant::now();

        let mut child = command.spawn().map_err(|source| SessionError::Spawn {
            program: executable.program.clone(),
            source,
        })?;

        let outcome = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => classify_exit(status),
            Ok(Err(e)) => {
                terminate(&mut child, os).await;
                return Err(SessionError::io(&executable.program, e));
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout_ms(),
                    "Execution timed out - killing process"
                );
                terminate(&mut child, os).await;
                RunOutcome::TimedOut
            }
        };

        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        match outcome {
            RunOutcome::Success => {
                debug!(execution_ms = execution_time_ms, "Process exited successfully");
            }
            RunOutcome::RuntimeError { exit_code } => {
                warn!(execution_ms = execution_time_ms, exit_code = ?exit_code, "Process failed");
            }
            RunOutcome::TimedOut => {}
        }

        Ok(ExecutionOutput {
            outcome,
            execution_time_ms,
        })
    }
}

async fn open_std(
    file: std::io::Result<tokio::fs::File>,
    path: &Path,
) -> Result<std::fs::File, SessionError> {
    match file {
        Ok(file) => Ok(file.into_std().await),
        Err(e) => Err(SessionError::io(path, e)),
    }
}

fn classify_exit(status: ExitStatus) -> RunOutcome {
    match status.code() {
        Some(0) => RunOutcome::Success,
        Some(code) => RunOutcome::RuntimeError {
            exit_code: Some(code),
        },
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                if let Some(signal) = status.signal() {
                    match signal {
                        libc::SIGSEGV => debug!(signal, "Process killed: segmentation fault"),
                        libc::SIGKILL => debug!(signal, "Process killed: likely out of memory"),
                        _ => debug!(signal, "Process killed by signal"),
                    }
                }
            }
            RunOutcome::RuntimeError { exit_code: None }
        }
    }
}

/// Kill the child and reap it. Best-effort: failures are logged only.
async fn terminate(child: &mut Child, os: OsKind) {
    #[cfg(unix)]
    if os == OsKind::Linux {
        if let Some(pid) = child.id() {
            // SAFETY: kill(2) only signals the process group created at spawn.
            let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
            if rc != 0 {
                debug!(pid, "Process group already gone");
            }
        }
    }
    #[cfg(not(unix))]
    let _ = os;

    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill process");
    }
}
