// Harness runtime settings
use std::path::PathBuf;

pub const DEFAULT_TIMEOUT_MS: u64 = 6000;
pub const DEFAULT_LANGUAGES_PATH: &str = "config/languages.json";

pub const TIMEOUT_ENV: &str = "CPJUDGE_TIMEOUT_MS";
pub const LANGUAGES_ENV: &str = "CPJUDGE_LANGUAGES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Wall-clock limit per fixture run
    pub timeout_ms: u64,
    pub languages_path: PathBuf,
}

impl HarnessSettings {
    pub fn new() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            languages_path: PathBuf::from(DEFAULT_LANGUAGES_PATH),
        }
    }

    /// Defaults overridden by CPJUDGE_* environment variables.
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::new();
        if let Some(ms) = lookup(TIMEOUT_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            if ms > 0 {
                settings.timeout_ms = ms;
            }
        }
        if let Some(path) = lookup(LANGUAGES_ENV).filter(|v| !v.is_empty()) {
            settings.languages_path = PathBuf::from(path);
        }
        settings
    }
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self::new()
    }
}
