use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal conditions of a test session
///
/// Output mismatches are not errors: they are recorded per fixture and the
/// session keeps going. Everything here stops the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Problem solution file not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("Tests not found: {}", .0.display())]
    FixturesMissing(PathBuf),

    #[error("Compilation failed: {0}")]
    Compile(String),

    #[error("Runtime error on test {fixture}{}", exit_detail(.exit_code))]
    RuntimeError { fixture: u32, exit_code: Option<i32> },

    #[error("Time limit exceeded on test {fixture} ({timeout_ms}ms)")]
    TimedOut { fixture: u32, timeout_ms: u64 },

    #[error("Could not start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn exit_detail(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!(" (exit code {})", code),
        None => " (terminated by signal)".to_string(),
    }
}

impl SessionError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SessionError::Io {
            path: path.into(),
            source,
        }
    }

    /// Structural errors are detected before any fixture is run
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SessionError::InputMissing(_) | SessionError::FixturesMissing(_) | SessionError::Compile(_)
        )
    }
}
