use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Host platform family; selects process-invocation details only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    Linux,
    Windows,
}

impl OsKind {
    /// Platform the harness was built for
    pub fn detect() -> Self {
        if cfg!(windows) {
            OsKind::Windows
        } else {
            OsKind::Linux
        }
    }

    /// Suffix appended to compiled native executables
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            OsKind::Linux => "",
            OsKind::Windows => ".exe",
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsKind::Linux => write!(f, "linux"),
            OsKind::Windows => write!(f, "windows"),
        }
    }
}

/// Classified result of running the solution against one fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Success,
    /// Non-zero exit; `exit_code` is None when the process died from a signal
    RuntimeError { exit_code: Option<i32> },
    TimedOut,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "success"),
            RunOutcome::RuntimeError { exit_code: Some(code) } => {
                write!(f, "runtime error (exit code {})", code)
            }
            RunOutcome::RuntimeError { exit_code: None } => {
                write!(f, "runtime error (killed by signal)")
            }
            RunOutcome::TimedOut => write!(f, "time limit exceeded"),
        }
    }
}

/// Per-fixture entry of a session report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureReport {
    pub index: u32,
    pub passed: bool,
    pub execution_time_ms: u64,
}

/// Summary of a session that reached its Done state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub solution: PathBuf,
    pub tests_dir: PathBuf,
    pub result_log: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub fixtures: Vec<FixtureReport>,
}

impl SessionReport {
    /// Session verdict: true only if every processed fixture compared equal
    pub fn verdict(&self) -> bool {
        self.fixtures.iter().all(|f| f.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.fixtures.iter().filter(|f| f.passed).count()
    }
}
