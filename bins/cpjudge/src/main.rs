mod compiler;
mod config;
mod engine;
mod error;
mod evaluator;
mod fixtures;
mod notifier;
mod paths;
mod result_log;
mod session;
mod session_tests;

use anyhow::Result;
use clap::{Parser, Subcommand};
use compiler::CommandCompiler;
use config::LanguageConfigManager;
use cpjudge_common::config::HarnessSettings;
use cpjudge_common::types::OsKind;
use engine::ProcessEngine;
use notifier::ConsoleNotifier;
use paths::DefaultPathResolver;
use session::{SessionOptions, TestSession};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "cpjudge")]
#[command(about = "cpjudge - Run a solution against its Tests folder", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a solution and run it against Tests/input_N.txt
    Run {
        /// Solution source file
        solution: String,

        /// Time limit per test in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Path to languages.json
        #[arg(short, long)]
        languages: Option<PathBuf>,

        /// Empty Tests/result.txt before running
        #[arg(long, default_value = "false")]
        fresh_log: bool,

        /// Print the result log to stderr whenever it is offered
        #[arg(long, default_value = "false")]
        show_results: bool,

        /// Print the session report as JSON on stdout
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List configured languages
    Langs {
        /// Path to languages.json
        #[arg(short, long)]
        languages: Option<PathBuf>,
    },

    /// Print a file as the comparator sees it
    Normalize {
        file: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.with_line_number(true).init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = HarnessSettings::from_env();

    match cli.command {
        Commands::Run {
            solution,
            timeout_ms,
            languages,
            fresh_log,
            show_results,
            json,
        } => {
            let languages_path = languages.unwrap_or(settings.languages_path);
            let timeout_ms = timeout_ms.unwrap_or(settings.timeout_ms);
            let os = OsKind::detect();

            let languages = LanguageConfigManager::load_or_builtin(&languages_path)
                .map_err(|e| {
                    error!("Failed to load language configurations: {:#}", e);
                    e
                })?;
            info!(
                languages = ?languages.list_languages(),
                timeout_ms = timeout_ms,
                os = %os,
                "cpjudge starting"
            );

            let session = TestSession::new(
                Box::new(CommandCompiler::new(languages, os)),
                Box::new(ConsoleNotifier::new(show_results)),
                Box::new(DefaultPathResolver),
                ProcessEngine::new(timeout_ms),
                os,
            )
            .with_options(SessionOptions { fresh_log });

            match session.run(&solution).await {
                Ok(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    if report.verdict() {
                        Ok(ExitCode::SUCCESS)
                    } else {
                        Ok(ExitCode::FAILURE)
                    }
                }
                // Already reported through the notifier
                Err(_) => Ok(ExitCode::FAILURE),
            }
        }
        Commands::Langs { languages } => {
            let path = languages.unwrap_or(settings.languages_path);
            let manager = LanguageConfigManager::load_or_builtin(&path)?;
            for name in manager.list_languages() {
                let lang = manager.get_config(&name)?;
                println!("{:<8} .{}", lang.name, lang.extensions.join(" ."));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Normalize { file } => {
            let content = evaluator::read_text(&file).await?;
            println!("{}", evaluator::normalize(&content));
            Ok(ExitCode::SUCCESS)
        }
    }
}
