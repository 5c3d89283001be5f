//! User-facing notification channel.
//!
//! The session emits three kinds of events. Events with an action carry a
//! label; when the user picks it the result log is shown.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;

pub const SHOW_RESULT: &str = "Show Result";
pub const SHOW_RESULTS: &str = "Show Results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Error(String),
    InfoWithAction { message: String, action: String },
    ErrorWithAction { message: String, action: String },
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Error(message) => message,
            Notification::InfoWithAction { message, .. } => message,
            Notification::ErrorWithAction { message, .. } => message,
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            Notification::Error(_) => None,
            Notification::InfoWithAction { action, .. } => Some(action),
            Notification::ErrorWithAction { action, .. } => Some(action),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Display a notification; returns the chosen action label, if any
    async fn notify(&self, notification: Notification) -> Option<String>;

    /// Open the result log for viewing
    async fn show_result_log(&self, path: &Path) -> Result<()>;
}

/// Terminal notifier
///
/// Messages go to stderr. With `accept_actions` every offered action is taken,
/// which prints the result log to stderr as well; stdout is left to the
/// session report.
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier {
    accept_actions: bool,
}

impl ConsoleNotifier {
    pub fn new(accept_actions: bool) -> Self {
        Self { accept_actions }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, notification: Notification) -> Option<String> {
        let marker = match notification {
            Notification::InfoWithAction { .. } => "✓",
            _ => "✗",
        };
        eprintln!("{} {}", marker, notification.message());

        if self.accept_actions {
            notification.action().map(str::to_string)
        } else {
            None
        }
    }

    async fn show_result_log(&self, path: &Path) -> Result<()> {
        copy_result_log(path, &mut std::io::stderr()).await
    }
}

async fn copy_result_log(path: &Path, out: &mut impl Write) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read result log {}", path.display()))?;
    writeln!(out, "{}", content).context("Failed to print result log")?;
    Ok(())
}
