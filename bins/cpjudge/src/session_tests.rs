/// Scenario tests for the test session orchestrator
///
/// These tests verify the end-to-end flow against real child processes:
/// 1. Structural errors stop the session before any log side effect
/// 2. Output mismatches are tolerated and iteration continues
/// 3. Runtime errors and timeouts abort the session immediately
/// 4. Fixture enumeration stops at the first gap
/// 5. The result log holds one record per processed fixture
///
/// Solutions are `sh` scripts, so the suite only runs on Unix.

#[cfg(all(test, unix))]
mod session_scenarios {
    use crate::compiler::{Compiler, Executable};
    use crate::engine::ProcessEngine;
    use crate::error::SessionError;
    use crate::notifier::{Notification, Notifier, SHOW_RESULT, SHOW_RESULTS};
    use crate::paths::DefaultPathResolver;
    use crate::session::{SessionOptions, TestSession};
    use async_trait::async_trait;
    use cpjudge_common::layout::{FixtureLayout, RECORD_SEPARATOR};
    use cpjudge_common::types::OsKind;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    /// Runs the solution file with `sh`; counts invocations
    #[derive(Clone, Default)]
    struct ShellCompiler {
        calls: Arc<Mutex<u32>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl Compiler for ShellCompiler {
        async fn compile(&self, solution: &Path, _tests_dir: &Path) -> Result<Executable, SessionError> {
            *self.calls.lock().unwrap() += 1;
            if let Some(msg) = &self.fail_with {
                return Err(SessionError::Compile(msg.clone()));
            }
            Ok(Executable {
                program: PathBuf::from("sh"),
                args: vec![solution.display().to_string()],
            })
        }
    }

    /// Records every notification and every request to open the result log
    #[derive(Clone, Default)]
    struct RecordingNotifier {
        accept_actions: bool,
        events: Arc<Mutex<Vec<Notification>>>,
        opened: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl RecordingNotifier {
        fn accepting() -> Self {
            Self {
                accept_actions: true,
                ..Default::default()
            }
        }

        fn events(&self) -> Vec<Notification> {
            self.events.lock().unwrap().clone()
        }

        fn opened(&self) -> Vec<PathBuf> {
            self.opened.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) -> Option<String> {
            let chosen = if self.accept_actions {
                notification.action().map(str::to_string)
            } else {
                None
            };
            self.events.lock().unwrap().push(notification);
            chosen
        }

        async fn show_result_log(&self, path: &Path) -> anyhow::Result<()> {
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    /// Problem folder with a solution script and an optional Tests directory
    struct Problem {
        dir: tempfile::TempDir,
    }

    impl Problem {
        fn new(script: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("solution.sh"), script).unwrap();
            std::fs::create_dir(dir.path().join("Tests")).unwrap();
            Self { dir }
        }

        fn without_tests(script: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("solution.sh"), script).unwrap();
            Self { dir }
        }

        fn layout(&self) -> FixtureLayout {
            FixtureLayout::new(self.dir.path().join("Tests"))
        }

        fn fixture(&self, index: u32, input: &str, expected: &str) -> &Self {
            let layout = self.layout();
            std::fs::write(layout.input(index), input).unwrap();
            std::fs::write(layout.expected(index), expected).unwrap();
            self
        }

        fn solution(&self) -> String {
            self.dir.path().join("solution.sh").display().to_string()
        }

        fn result_log(&self) -> String {
            std::fs::read_to_string(self.layout().result_log()).unwrap_or_default()
        }

        fn record_count(&self) -> usize {
            self.result_log().matches(RECORD_SEPARATOR).count()
        }
    }

    fn session(compiler: &ShellCompiler, notifier: &RecordingNotifier, timeout_ms: u64) -> TestSession {
        TestSession::new(
            Box::new(compiler.clone()),
            Box::new(notifier.clone()),
            Box::new(DefaultPathResolver),
            ProcessEngine::new(timeout_ms),
            OsKind::Linux,
        )
    }

    const DOUBLER: &str = "read n\necho $((n * 2))\n";

    #[tokio::test]
    async fn test_missing_solution_is_input_missing() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "1\n", "2\n");
        let compiler = ShellCompiler::default();
        let notifier = RecordingNotifier::default();
        let missing = problem.dir.path().join("other.sh");

        let result = session(&compiler, &notifier, 5000)
            .run(&missing.display().to_string())
            .await;

        assert!(matches!(result, Err(SessionError::InputMissing(_))));
        assert_eq!(
            notifier.events(),
            vec![Notification::Error("Problem solution file not found.".to_string())]
        );
        assert_eq!(*compiler.calls.lock().unwrap(), 0);
        assert!(!problem.layout().result_log().exists());
    }

    #[tokio::test]
    async fn test_missing_tests_dir_is_fixtures_missing() {
        let problem = Problem::without_tests(DOUBLER);
        let compiler = ShellCompiler::default();
        let notifier = RecordingNotifier::default();

        let result = session(&compiler, &notifier, 5000).run(&problem.solution()).await;

        assert!(matches!(result, Err(SessionError::FixturesMissing(_))));
        assert_eq!(
            notifier.events(),
            vec![Notification::Error("Tests not found.".to_string())]
        );
        assert_eq!(*compiler.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_compile_error_runs_no_fixture() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "1\n", "2\n");
        let compiler = ShellCompiler {
            fail_with: Some("solution.sh:1: syntax error".to_string()),
            ..Default::default()
        };
        let notifier = RecordingNotifier::default();

        let result = session(&compiler, &notifier, 5000).run(&problem.solution()).await;

        assert!(matches!(result, Err(SessionError::Compile(_))));
        assert!(!problem.layout().actual(1).exists());
        assert!(!problem.layout().result_log().exists());
        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].message().contains("syntax error"));
    }

    #[tokio::test]
    async fn test_all_fixtures_pass() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "1\n", "2\n").fixture(2, "5\n", "10\n").fixture(3, "0\n", "0");
        let compiler = ShellCompiler::default();
        let notifier = RecordingNotifier::accepting();

        let report = session(&compiler, &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        assert!(report.verdict());
        assert_eq!(report.fixtures.len(), 3);
        assert_eq!(problem.record_count(), 3);
        assert_eq!(
            notifier.events(),
            vec![Notification::InfoWithAction {
                message: "All test cases passed.".to_string(),
                action: SHOW_RESULTS.to_string(),
            }]
        );
        assert_eq!(notifier.opened(), vec![report.result_log.clone()]);
    }

    #[tokio::test]
    async fn test_unwritable_result_log_is_reported_and_session_continues() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "3\n", "6\n");
        std::fs::create_dir(problem.layout().result_log()).unwrap();
        let notifier = RecordingNotifier::default();

        let report = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        assert!(report.verdict());
        assert_eq!(report.fixtures.len(), 1);
        assert_eq!(
            notifier.events(),
            vec![
                Notification::Error("Could not write result.".to_string()),
                Notification::InfoWithAction {
                    message: "All test cases passed.".to_string(),
                    action: SHOW_RESULTS.to_string(),
                },
            ]
        );
        assert!(notifier.opened().is_empty());
    }

    #[tokio::test]
    async fn test_success_not_opened_when_action_declined() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "4\n", "8\n");
        let notifier = RecordingNotifier::default();

        let report = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        assert!(report.verdict());
        assert!(notifier.opened().is_empty());
    }

    #[tokio::test]
    async fn test_trailing_space_output_matches() {
        let problem = Problem::new("read n\nprintf '%s \\n' \"$n\"\n");
        problem.fixture(1, "5\n", "5\n");
        let notifier = RecordingNotifier::default();

        let report = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(problem.layout().actual(1)).unwrap(), "5 \n");
        assert!(report.fixtures[0].passed);
        assert!(report.verdict());
    }

    #[tokio::test]
    async fn test_mismatch_continues_to_next_fixture() {
        let problem = Problem::new(DOUBLER);
        // 2 * 2 = 4, expected 5
        problem.fixture(1, "1\n", "2\n").fixture(2, "2\n", "5\n");
        let notifier = RecordingNotifier::accepting();

        let report = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        assert!(!report.verdict());
        assert_eq!(report.fixtures.len(), 2);
        assert!(report.fixtures[0].passed);
        assert!(!report.fixtures[1].passed);
        assert_eq!(problem.record_count(), 2);
        assert_eq!(
            notifier.events(),
            vec![Notification::ErrorWithAction {
                message: "Test 2 failed".to_string(),
                action: SHOW_RESULT.to_string(),
            }]
        );
        assert_eq!(notifier.opened(), vec![report.result_log.clone()]);
    }

    #[tokio::test]
    async fn test_mismatch_in_middle_does_not_stop_iteration() {
        let problem = Problem::new(DOUBLER);
        problem
            .fixture(1, "1\n", "3\n")
            .fixture(2, "2\n", "4\n")
            .fixture(3, "3\n", "7\n");
        let notifier = RecordingNotifier::default();

        let report = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        let passed: Vec<bool> = report.fixtures.iter().map(|f| f.passed).collect();
        assert_eq!(passed, vec![false, true, false]);
        let messages: Vec<String> = notifier.events().iter().map(|n| n.message().to_string()).collect();
        assert_eq!(messages, vec!["Test 1 failed", "Test 3 failed"]);
    }

    #[tokio::test]
    async fn test_enumeration_stops_at_gap() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "1\n", "2\n").fixture(2, "2\n", "4\n").fixture(4, "4\n", "8\n");
        let notifier = RecordingNotifier::default();

        let report = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        let indices: Vec<u32> = report.fixtures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(!problem.layout().actual(4).exists());
        assert_eq!(problem.record_count(), 2);
    }

    #[tokio::test]
    async fn test_timeout_aborts_session() {
        let problem = Problem::new("read n\nif [ \"$n\" = 2 ]; then sleep 10; fi\necho $((n * 2))\n");
        problem.fixture(1, "1\n", "2\n").fixture(2, "2\n", "4\n").fixture(3, "3\n", "6\n");
        let notifier = RecordingNotifier::default();

        let result = session(&ShellCompiler::default(), &notifier, 1000)
            .run(&problem.solution())
            .await;

        match result {
            Err(SessionError::TimedOut { fixture, timeout_ms }) => {
                assert_eq!(fixture, 2);
                assert_eq!(timeout_ms, 1000);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        // fixture 1 was logged, nothing for 2 or later
        assert_eq!(problem.record_count(), 1);
        assert!(!problem.result_log().contains("Input 2:"));
        assert!(!problem.layout().actual(3).exists());
        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].message().starts_with("Time limit exceeded on test 2"));
    }

    #[tokio::test]
    async fn test_runtime_error_aborts_session() {
        let problem = Problem::new("read n\nif [ \"$n\" = 1 ]; then echo boom >&2; exit 7; fi\necho $((n * 2))\n");
        problem.fixture(1, "1\n", "2\n").fixture(2, "2\n", "4\n");
        let notifier = RecordingNotifier::default();

        let result = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await;

        assert!(matches!(
            result,
            Err(SessionError::RuntimeError { fixture: 1, exit_code: Some(7) })
        ));
        assert!(!problem.layout().result_log().exists());
        assert!(!problem.layout().actual(2).exists());
        assert_eq!(std::fs::read_to_string(problem.layout().stderr(1)).unwrap(), "boom\n");
        assert_eq!(
            notifier.events(),
            vec![Notification::Error("Runtime error on test 1 (exit code 7)".to_string())]
        );
    }

    #[tokio::test]
    async fn test_result_log_record_contents() {
        let problem = Problem::new("read n\necho $((n * 2))\necho \"n=$n\" >&2\n");
        problem.fixture(1, "3\n", "6\n");
        let notifier = RecordingNotifier::default();

        session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        let log = problem.result_log();
        assert!(log.starts_with("Input 1: \n3\n"));
        assert!(log.contains("Expected Output : \n6\n"));
        assert!(log.contains("Obtained Output : \n6\n"));
        assert!(log.contains("Standard Error : \nn=3\n"));
        assert!(log.ends_with(&format!("{}\n\n", RECORD_SEPARATOR)));
    }

    #[tokio::test]
    async fn test_result_log_appends_across_sessions() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "1\n", "2\n");
        let notifier = RecordingNotifier::default();
        let harness = session(&ShellCompiler::default(), &notifier, 5000);

        harness.run(&problem.solution()).await.unwrap();
        harness.run(&problem.solution()).await.unwrap();

        assert_eq!(problem.record_count(), 2);
    }

    #[tokio::test]
    async fn test_fresh_log_truncates_before_first_fixture() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "1\n", "2\n");
        std::fs::write(problem.layout().result_log(), "stale\n").unwrap();
        let notifier = RecordingNotifier::default();

        session(&ShellCompiler::default(), &notifier, 5000)
            .with_options(SessionOptions { fresh_log: true })
            .run(&problem.solution())
            .await
            .unwrap();

        assert!(!problem.result_log().contains("stale"));
        assert_eq!(problem.record_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_expected_output_aborts_with_io_error() {
        let problem = Problem::new(DOUBLER);
        std::fs::write(problem.layout().input(1), "1\n").unwrap();
        let notifier = RecordingNotifier::default();

        let result = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await;

        match result {
            Err(SessionError::Io { path, .. }) => assert!(path.ends_with("Tests/output_1.txt")),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "1\n", "2\n");
        let notifier = RecordingNotifier::default();

        struct MissingBinary;

        #[async_trait]
        impl Compiler for MissingBinary {
            async fn compile(&self, _solution: &Path, tests_dir: &Path) -> Result<Executable, SessionError> {
                Ok(Executable {
                    program: tests_dir.join("never-built"),
                    args: vec![],
                })
            }
        }

        let harness = TestSession::new(
            Box::new(MissingBinary),
            Box::new(notifier.clone()),
            Box::new(DefaultPathResolver),
            ProcessEngine::new(5000),
            OsKind::Linux,
        );

        let result = harness.run(&problem.solution()).await;

        assert!(matches!(result, Err(SessionError::Spawn { .. })));
        assert_eq!(notifier.events().len(), 1);
        assert!(notifier.events()[0].message().starts_with("Could not start"));
        assert!(!problem.layout().result_log().exists());
    }

    #[tokio::test]
    async fn test_report_paths() {
        let problem = Problem::new(DOUBLER);
        problem.fixture(1, "1\n", "2\n");
        let notifier = RecordingNotifier::default();

        let report = session(&ShellCompiler::default(), &notifier, 5000)
            .run(&problem.solution())
            .await
            .unwrap();

        let canonical_tests = std::fs::canonicalize(problem.layout().tests_dir()).unwrap();
        assert_eq!(report.tests_dir, canonical_tests);
        assert_eq!(report.result_log, canonical_tests.join("result.txt"));
        assert!(report.finished_at >= report.started_at);
    }
}
