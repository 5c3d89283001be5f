//! Test Session - End-to-End Orchestration
//!
//! **Responsibility:**
//! Drive one solution through compile, run, compare and log for every fixture.
//!
//! **State machine:**
//! `Init → Locating → Compiling → Iterating(i) → Done(verdict)`, with any
//! state able to exit to `Aborted`.
//!
//! **Failure asymmetry:**
//! - An output mismatch is recorded and reported, and iteration continues
//! - A runtime error, timeout or spawn failure aborts the whole session at
//!   once; the failing fixture gets no log record and no verdict is produced
//!
//! This module is the glue layer - it knows nothing about:
//! - How code executes (engine's job)
//! - How outputs are compared (evaluator's job)
//! - How the solution is built (compiler's job)

use crate::compiler::{Compiler, Executable};
use crate::engine::ProcessEngine;
use crate::error::SessionError;
use crate::evaluator;
use crate::fixtures::{has_fixture, Fixture};
use crate::notifier::{Notification, Notifier, SHOW_RESULT, SHOW_RESULTS};
use crate::paths::PathResolver;
use crate::result_log::{self, ResultRecord};
use chrono::Utc;
use cpjudge_common::layout::FixtureLayout;
use cpjudge_common::types::{FixtureReport, OsKind, RunOutcome, SessionReport};
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Locating,
    Compiling,
    Iterating(u32),
    Done(bool),
    Aborted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Init => write!(f, "init"),
            SessionState::Locating => write!(f, "locating"),
            SessionState::Compiling => write!(f, "compiling"),
            SessionState::Iterating(i) => write!(f, "iterating({})", i),
            SessionState::Done(verdict) => write!(f, "done({})", verdict),
            SessionState::Aborted => write!(f, "aborted"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Empty result.txt once compilation succeeded, before the first fixture
    pub fresh_log: bool,
}

/// Orchestrator for one solution; collaborators are injected so they can be
/// replaced in tests
pub struct TestSession {
    compiler: Box<dyn Compiler>,
    notifier: Box<dyn Notifier>,
    resolver: Box<dyn PathResolver>,
    engine: ProcessEngine,
    os: OsKind,
    options: SessionOptions,
}

impl TestSession {
    pub fn new(
        compiler: Box<dyn Compiler>,
        notifier: Box<dyn Notifier>,
        resolver: Box<dyn PathResolver>,
        engine: ProcessEngine,
        os: OsKind,
    ) -> Self {
        Self {
            compiler,
            notifier,
            resolver,
            engine,
            os,
            options: SessionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the session to completion or abort
    ///
    /// ## Returns
    /// `SessionReport` when every fixture was run (its verdict may still be
    /// false because of mismatches). Terminal errors are notified before they
    /// are returned.
    #[instrument(skip(self), fields(session_id = tracing::field::Empty, os = %self.os))]
    pub async fn run(&self, solution: &str) -> Result<SessionReport, SessionError> {
        let session_id = Uuid::new_v4();
        tracing::Span::current().record("session_id", tracing::field::display(session_id));

        let mut state = SessionState::Init;
        let result = self.drive(session_id, solution, &mut state).await;

        match &result {
            Ok(report) => {
                transition(&mut state, SessionState::Done(report.verdict()));
                info!(
                    fixtures = report.fixtures.len(),
                    passed = report.passed_count(),
                    verdict = report.verdict(),
                    "Session complete"
                );
                if report.verdict() {
                    self.offer_result_log(
                        Notification::InfoWithAction {
                            message: "All test cases passed.".to_string(),
                            action: SHOW_RESULTS.to_string(),
                        },
                        &report.result_log,
                    )
                    .await;
                }
            }
            Err(e) => {
                let from = state;
                transition(&mut state, SessionState::Aborted);
                error!(error = %e, state = %from, structural = e.is_structural(), "Session aborted");
                self.notifier.notify(Notification::Error(user_message(e))).await;
            }
        }

        result
    }

    async fn drive(
        &self,
        session_id: Uuid,
        raw_solution: &str,
        state: &mut SessionState,
    ) -> Result<SessionReport, SessionError> {
        let started_at = Utc::now();

        // Init
        let solution = self.resolver.refine_path(raw_solution, self.os);
        if !solution.is_file() {
            return Err(SessionError::InputMissing(solution));
        }

        transition(state, SessionState::Locating);
        let layout = FixtureLayout::for_solution(&solution);
        if !layout.tests_dir().is_dir() {
            return Err(SessionError::FixturesMissing(layout.tests_dir().to_path_buf()));
        }
        let result_log = layout.result_log();

        transition(state, SessionState::Compiling);
        let executable = self.compiler.compile(&solution, layout.tests_dir()).await?;
        debug!(program = %executable.program.display(), args = ?executable.args, "Solution ready");

        if self.options.fresh_log {
            result_log::truncate(&result_log)
                .await
                .map_err(|e| SessionError::io(&result_log, e))?;
        }

        let mut fixtures = Vec::new();
        let mut index = 1;
        while has_fixture(&layout, index) {
            transition(state, SessionState::Iterating(index));
            let fixture = Fixture::new(&layout, index);
            let report = self
                .run_fixture(&executable, &fixture, layout.tests_dir(), &result_log)
                .await?;
            fixtures.push(report);
            index += 1;
        }

        let report = SessionReport {
            session_id,
            solution,
            tests_dir: layout.tests_dir().to_path_buf(),
            result_log,
            started_at,
            finished_at: Utc::now(),
            fixtures,
        };

        if report.fixtures.is_empty() {
            warn!("No fixtures found - expected {}", layout.input(1).display());
        }

        Ok(report)
    }

    #[instrument(skip_all, fields(fixture = fixture.index))]
    async fn run_fixture(
        &self,
        executable: &Executable,
        fixture: &Fixture,
        working_dir: &Path,
        result_log: &Path,
    ) -> Result<FixtureReport, SessionError> {
        let execution = self
            .engine
            .run(
                executable,
                &fixture.input,
                &fixture.actual,
                working_dir,
                &fixture.stderr,
                self.os,
            )
            .await?;

        match execution.outcome {
            RunOutcome::Success => {}
            RunOutcome::RuntimeError { exit_code } => {
                return Err(SessionError::RuntimeError {
                    fixture: fixture.index,
                    exit_code,
                });
            }
            RunOutcome::TimedOut => {
                return Err(SessionError::TimedOut {
                    fixture: fixture.index,
                    timeout_ms: self.engine.timeout_ms(),
                });
            }
        }

        let passed = evaluator::compare(&fixture.expected, &fixture.actual).await?;
        let record = ResultRecord::read(fixture).await?;

        if let Err(e) = result_log::append(result_log, &record.render()).await {
            // Logging is best-effort
            warn!(error = %e, path = %result_log.display(), "Failed to append result record");
            self.notifier
                .notify(Notification::Error("Could not write result.".to_string()))
                .await;
        }

        info!(
            passed = passed,
            execution_ms = execution.execution_time_ms,
            "Test result"
        );

        if !passed {
            self.offer_result_log(
                Notification::ErrorWithAction {
                    message: format!("Test {} failed", fixture.index),
                    action: SHOW_RESULT.to_string(),
                },
                result_log,
            )
            .await;
        }

        Ok(FixtureReport {
            index: fixture.index,
            passed,
            execution_time_ms: execution.execution_time_ms,
        })
    }

    async fn offer_result_log(&self, notification: Notification, result_log: &Path) {
        let offered = notification.action().map(str::to_string);
        let chosen = self.notifier.notify(notification).await;
        if chosen.is_some() && chosen == offered {
            if let Err(e) = self.notifier.show_result_log(result_log).await {
                warn!(error = %e, "Failed to open result log");
            }
        }
    }
}

fn transition(state: &mut SessionState, next: SessionState) {
    debug!(from = %state, to = %next, "Session state");
    *state = next;
}

/// Text shown to the user for a terminal error
pub fn user_message(error: &SessionError) -> String {
    match error {
        SessionError::InputMissing(_) => "Problem solution file not found.".to_string(),
        SessionError::FixturesMissing(_) => "Tests not found.".to_string(),
        other => other.to_string(),
    }
}

