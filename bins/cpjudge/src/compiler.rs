//! Compilation step: turns a solution file into something the engine can run.

use crate::config::{CommandTemplate, LanguageConfigManager};
use crate::error::SessionError;
use async_trait::async_trait;
use cpjudge_common::types::OsKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// A runnable solution: program plus fixed arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[async_trait]
pub trait Compiler: Send + Sync {
    /// Build the solution. Any failure is fatal to the session and is reported
    /// as `SessionError::Compile`.
    async fn compile(&self, solution: &Path, tests_dir: &Path) -> Result<Executable, SessionError>;
}

/// Values substituted into `{placeholder}` arguments
#[derive(Debug, Clone)]
struct Placeholders {
    source: String,
    source_dir: String,
    tests_dir: String,
    stem: String,
    exe_suffix: &'static str,
    executable: String,
}

impl Placeholders {
    fn new(solution: &Path, tests_dir: &Path, os: OsKind) -> Self {
        let stem = solution
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "solution".to_string());
        let exe_suffix = os.exe_suffix();
        let executable = tests_dir.join(format!("{}{}", stem, exe_suffix));
        Self {
            source: solution.display().to_string(),
            source_dir: solution
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            tests_dir: tests_dir.display().to_string(),
            stem,
            exe_suffix,
            executable: executable.display().to_string(),
        }
    }

    fn expand(&self, template: &str) -> String {
        template
            .replace("{source_dir}", &self.source_dir)
            .replace("{source}", &self.source)
            .replace("{tests_dir}", &self.tests_dir)
            .replace("{executable}", &self.executable)
            .replace("{exe_suffix}", self.exe_suffix)
            .replace("{stem}", &self.stem)
    }

    fn expand_command(&self, template: &CommandTemplate) -> (String, Vec<String>) {
        let program = self.expand(&template.command);
        let args = template.args.iter().map(|a| self.expand(a)).collect();
        (program, args)
    }
}

/// Compiler driven by languages.json: picks the language by file extension,
/// runs its compile command inside the Tests directory and derives the run command
pub struct CommandCompiler {
    languages: LanguageConfigManager,
    os: OsKind,
}

impl CommandCompiler {
    pub fn new(languages: LanguageConfigManager, os: OsKind) -> Self {
        Self { languages, os }
    }
}

#[async_trait]
impl Compiler for CommandCompiler {
    #[instrument(skip(self), fields(os = %self.os))]
    async fn compile(&self, solution: &Path, tests_dir: &Path) -> Result<Executable, SessionError> {
        let language = self
            .languages
            .for_source(solution)
            .map_err(|e| SessionError::Compile(e.to_string()))?;
        let vars = Placeholders::new(solution, tests_dir, self.os);

        if let Some(step) = &language.compile {
            let (program, args) = vars.expand_command(step);
            info!(language = %language.name, compiler = %program, "Compiling solution");

            let start_time = Instant::now();
            let output = Command::new(&program)
                .args(&args)
                .current_dir(tests_dir)
                .output()
                .await
                .map_err(|e| {
                    SessionError::Compile(format!("Failed to start compiler '{}': {}", program, e))
                })?;
            let compilation_time_ms = start_time.elapsed().as_millis() as u64;

            if !output.status.success() {
                let mut diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let stdout = String::from_utf8_lossy(&output.stdout);
                if !stdout.trim().is_empty() {
                    if !diagnostics.is_empty() {
                        diagnostics.push('\n');
                    }
                    diagnostics.push_str(stdout.trim());
                }
                if diagnostics.is_empty() {
                    diagnostics = format!("{} exited with {}", program, output.status);
                }
                warn!(
                    compilation_time_ms = compilation_time_ms,
                    language = %language.name,
                    error_preview = diagnostics.lines().next().unwrap_or(""),
                    "Compilation failed"
                );
                return Err(SessionError::Compile(diagnostics));
            }

            info!(
                compilation_time_ms = compilation_time_ms,
                language = %language.name,
                "Compilation succeeded"
            );
        } else {
            info!(language = %language.name, "Interpreted language - nothing to compile");
        }

        let (program, args) = vars.expand_command(&language.run);
        Ok(Executable {
            program: PathBuf::from(program),
            args,
        })
    }
}
