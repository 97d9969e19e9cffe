use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::crew::abbreviate;
use crate::{nlog_debug, Error, Result};

pub const DEFAULT_TOPIC: &str = "Cancer Health Care";

pub const DEFAULT_SUBTOPICS: [&str; 5] = [
    "Cancer Research & Prevention",
    "Early Detection and Diagnosis",
    "Cancer Drug Discovery and Development",
    "Cancer Treatment Methods",
    "Precision Oncology",
];

/// Provider keys the engine's search and embedding tools read.
pub const PROVIDER_KEYS: [&str; 2] = ["SERPER_API_KEY", "OPENAI_API_KEY"];

const CONFIG_FILE: &str = "newsdesk.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub topic: String,
    pub subtopics: Vec<String>,
    /// Extra entries for the dashboard's topic selector.
    pub topics: Vec<TopicConfig>,
    pub output_dir: String,
    pub memory_dir: String,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicConfig {
    pub name: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable that runs the crew; resolved on PATH.
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Recorded crew output to replay instead of running a command.
    pub replay: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            subtopics: DEFAULT_SUBTOPICS.iter().map(|s| s.to_string()).collect(),
            topics: Vec::new(),
            output_dir: "./output".to_string(),
            memory_dir: "./memory".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn effective_command(&self) -> &str {
        self.command.as_deref().unwrap_or("crewai-runner")
    }
}

impl Config {
    pub fn home_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".newsdesk"))
    }

    /// Resolve the config file: explicit path, then `./newsdesk.toml`, then
    /// `~/.newsdesk/newsdesk.toml`.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        Self::home_dir()
            .ok()
            .map(|dir| dir.join(CONFIG_FILE))
            .filter(|p| p.exists())
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::locate(explicit) else {
            nlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        nlog_debug!("Config::load_from path={}", path.display());
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        nlog_debug!(
            "Config loaded: topic={} subtopics={} engine={:?}",
            config.topic,
            config.subtopics.len(),
            config.engine
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(Error::Validation("topic must not be empty".to_string()));
        }
        for choice in self.topic_choices() {
            validate_subtopics(&choice)?;
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_tilde(&self.output_dir)
    }

    pub fn memory_dir(&self) -> PathBuf {
        expand_tilde(&self.memory_dir)
    }

    /// Topics offered by the dashboard selector; the configured topic comes first.
    pub fn topic_choices(&self) -> Vec<TopicConfig> {
        let mut choices = vec![TopicConfig {
            name: self.topic.clone(),
            subtopics: self.subtopics.clone(),
        }];
        for extra in &self.topics {
            if choices.iter().any(|c| c.name == extra.name) {
                continue;
            }
            let subtopics = if extra.subtopics.is_empty() {
                self.subtopics.clone()
            } else {
                extra.subtopics.clone()
            };
            choices.push(TopicConfig {
                name: extra.name.clone(),
                subtopics,
            });
        }
        choices
    }

    /// Copy of this config targeting another topic.
    pub fn with_topic(&self, choice: &TopicConfig) -> Self {
        Self {
            topic: choice.name.clone(),
            subtopics: choice.subtopics.clone(),
            ..self.clone()
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.output_dir(), self.memory_dir()] {
            if !dir.exists() {
                nlog_debug!("Creating directory: {}", dir.display());
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}

/// Task names are built from subtopic abbreviations, so those must be
/// present and distinct within a topic.
fn validate_subtopics(choice: &TopicConfig) -> Result<()> {
    if choice.subtopics.is_empty() {
        return Err(Error::Validation(format!(
            "topic '{}' needs at least one subtopic",
            choice.name
        )));
    }
    let mut seen: HashMap<String, &str> = HashMap::new();
    for sub in &choice.subtopics {
        let abbr = abbreviate(sub);
        if abbr.is_empty() {
            return Err(Error::Validation(format!(
                "subtopic '{sub}' has no letters to name its tasks"
            )));
        }
        if let Some(other) = seen.insert(abbr.clone(), sub.as_str()) {
            return Err(Error::Validation(format!(
                "subtopics '{other}' and '{sub}' both abbreviate to '{abbr}'"
            )));
        }
    }
    Ok(())
}

/// Load `.env` (if present) into the process environment.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => nlog_debug!("Loaded environment from {}", path.display()),
        Err(e) => nlog_debug!("No .env loaded: {}", e),
    }
}

/// Provider keys that are unset or empty.
pub fn missing_provider_keys() -> Vec<&'static str> {
    PROVIDER_KEYS
        .iter()
        .copied()
        .filter(|key| std::env::var(key).map(|v| v.is_empty()).unwrap_or(true))
        .collect()
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
