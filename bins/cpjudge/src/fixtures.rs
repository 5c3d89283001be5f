// Fixture discovery
use cpjudge_common::layout::FixtureLayout;
use std::path::PathBuf;

/// Whether fixture `index` exists, i.e. its input file is present.
/// Enumeration is interleaved with execution: the session probes index
/// 1, 2, ... and stops at the first gap.
pub fn has_fixture(layout: &FixtureLayout, index: u32) -> bool {
    layout.input(index).is_file()
}

/// All files belonging to one fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub index: u32,
    pub input: PathBuf,
    pub expected: PathBuf,
    pub actual: PathBuf,
    pub stderr: PathBuf,
}

impl Fixture {
    pub fn new(layout: &FixtureLayout, index: u32) -> Self {
        Self {
            index,
            input: layout.input(index),
            expected: layout.expected(index),
            actual: layout.actual(index),
            stderr: layout.stderr(index),
        }
    }
}
