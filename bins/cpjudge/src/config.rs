// Language configuration management for cpjudge
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A command line with `{placeholder}` arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    /// File extensions without the leading dot
    pub extensions: Vec<String>,
    /// Absent for interpreted languages
    #[serde(default)]
    pub compile: Option<CommandTemplate>,
    pub run: CommandTemplate,
}

#[derive(Debug, Serialize, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageConfig>,
}

/// Language configuration manager
#[derive(Debug, Clone)]
pub struct LanguageConfigManager {
    configs: HashMap<String, LanguageConfig>,
}

impl LanguageConfigManager {
    /// Load language configurations from a languages.json file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Language config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Load from `config_path` when it exists, built-in defaults otherwise
    pub fn load_or_builtin(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            Ok(Self::builtin())
        }
    }

    fn from_json(content: &str) -> Result<Self> {
        let languages_json: LanguagesJson = serde_json::from_str(content)?;
        Self::from_languages(languages_json.languages)
    }

    fn from_languages(languages: Vec<LanguageConfig>) -> Result<Self> {
        let mut configs = HashMap::new();
        for lang in languages {
            if lang.extensions.is_empty() {
                bail!("Language '{}' declares no file extensions", lang.name);
            }
            if configs.contains_key(&lang.name) {
                bail!("Language '{}' is declared twice", lang.name);
            }
            configs.insert(lang.name.clone(), lang);
        }
        Ok(Self { configs })
    }

    /// Defaults used when no languages.json is present
    pub fn builtin() -> Self {
        let languages = vec![
            LanguageConfig {
                name: "cpp".to_string(),
                extensions: vec!["cpp".to_string(), "cc".to_string(), "cxx".to_string()],
                compile: Some(CommandTemplate::new(
                    "g++",
                    &["-std=c++17", "-O2", "-o", "{executable}", "{source}"],
                )),
                run: CommandTemplate::new("{executable}", &[]),
            },
            LanguageConfig {
                name: "c".to_string(),
                extensions: vec!["c".to_string()],
                compile: Some(CommandTemplate::new(
                    "gcc",
                    &["-O2", "-o", "{executable}", "{source}", "-lm"],
                )),
                run: CommandTemplate::new("{executable}", &[]),
            },
            LanguageConfig {
                name: "rust".to_string(),
                extensions: vec!["rs".to_string()],
                compile: Some(CommandTemplate::new(
                    "rustc",
                    &["-O", "-o", "{executable}", "{source}"],
                )),
                run: CommandTemplate::new("{executable}", &[]),
            },
            LanguageConfig {
                name: "java".to_string(),
                extensions: vec!["java".to_string()],
                compile: Some(CommandTemplate::new("javac", &["-d", "{tests_dir}", "{source}"])),
                run: CommandTemplate::new("java", &["-cp", "{tests_dir}", "{stem}"]),
            },
            LanguageConfig {
                name: "python".to_string(),
                extensions: vec!["py".to_string()],
                compile: None,
                run: CommandTemplate::new("python3", &["{source}"]),
            },
        ];
        Self::from_languages(languages).unwrap_or_else(|_| Self {
            configs: HashMap::new(),
        })
    }

    /// Get configuration for a language by name
    pub fn get_config(&self, name: &str) -> Result<&LanguageConfig> {
        self.configs
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("No configuration found for language: {}", name))
    }

    /// Pick the language whose extensions match the source file
    pub fn for_source(&self, source: &Path) -> Result<&LanguageConfig> {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Source file has no extension: {}", source.display()))?;

        self.configs
            .values()
            .find(|lang| lang.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
            .ok_or_else(|| anyhow::anyhow!("No language configured for .{} files", ext))
    }

    /// List all supported languages, sorted by name
    pub fn list_languages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }
}
