use std::path::{Path, PathBuf};

/// Fixture file naming convention - defines only names, not I/O
/// Ensures the harness and test authors never drift: every fixture file
/// lives in the Tests folder next to the solution and is keyed by a 1-based index

pub const TESTS_DIR_NAME: &str = "Tests";
pub const INPUT_PREFIX: &str = "input";
pub const EXPECTED_PREFIX: &str = "output";
pub const ACTUAL_PREFIX: &str = "code_output";
pub const STDERR_PREFIX: &str = "stderr";
pub const RESULT_LOG_NAME: &str = "result.txt";
pub const FIXTURE_EXTENSION: &str = "txt";

/// Separator written after every record of the result log
pub const RECORD_SEPARATOR: &str = "________________________________________________________";

fn fixture_file(tests_dir: &Path, prefix: &str, index: u32) -> PathBuf {
    tests_dir.join(format!("{}_{}.{}", prefix, index, FIXTURE_EXTENSION))
}

/// Derive the Tests directory from the solution file's parent directory
pub fn tests_dir_for(solution: &Path) -> PathBuf {
    solution
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(TESTS_DIR_NAME)
}

/// Resolved paths for one test session
///
/// Computed once at session start and threaded through every component,
/// so the result log location is never recomputed ad hoc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureLayout {
    tests_dir: PathBuf,
}

impl FixtureLayout {
    pub fn new(tests_dir: impl Into<PathBuf>) -> Self {
        Self {
            tests_dir: tests_dir.into(),
        }
    }

    pub fn for_solution(solution: &Path) -> Self {
        Self::new(tests_dir_for(solution))
    }

    pub fn tests_dir(&self) -> &Path {
        &self.tests_dir
    }

    /// Author-provided input for fixture `index`
    pub fn input(&self, index: u32) -> PathBuf {
        fixture_file(&self.tests_dir, INPUT_PREFIX, index)
    }

    /// Author-provided expected output for fixture `index`
    pub fn expected(&self, index: u32) -> PathBuf {
        fixture_file(&self.tests_dir, EXPECTED_PREFIX, index)
    }

    /// Output produced by the solution for fixture `index`
    pub fn actual(&self, index: u32) -> PathBuf {
        fixture_file(&self.tests_dir, ACTUAL_PREFIX, index)
    }

    /// Standard error produced by the solution for fixture `index`
    pub fn stderr(&self, index: u32) -> PathBuf {
        fixture_file(&self.tests_dir, STDERR_PREFIX, index)
    }

    pub fn result_log(&self) -> PathBuf {
        self.tests_dir.join(RESULT_LOG_NAME)
    }
}
