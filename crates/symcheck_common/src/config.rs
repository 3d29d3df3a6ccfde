//! Symcheck Configuration
//!
//! Configuration lives in `$SYMCHECK_CONFIG`, else
//! `<config dir>/symcheck/config.toml`. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::candidates::ExclusionPolicy;
use crate::error::{Result, SymcheckError};
use crate::reference::ReferenceSource;
use crate::retry::{RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_DELAY_MS};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "SYMCHECK_CONFIG";
const CONFIG_DIR: &str = "symcheck";
const CONFIG_FILE: &str = "config.toml";

/// Knowledge graph endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// SPARQL endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_graph_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_endpoint() -> String {
    "https://dbpedia.org/sparql".to_string()
}

fn default_graph_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("symcheck/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_graph_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry settings for graph lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per lookup (valid: 1-10)
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Delay between attempts (milliseconds, max 60000)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

impl RetryConfig {
    pub fn effective_attempts(&self) -> u32 {
        self.attempts.clamp(1, 10)
    }

    pub fn effective_delay_ms(&self) -> u64 {
        self.delay_ms.min(60_000)
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.effective_attempts(),
            Duration::from_millis(self.effective_delay_ms()),
        )
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Question engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub exclusion_policy: ExclusionPolicy,

    /// Stop asking after this many questions (unset: no cap)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_questions: Option<u32>,
}

/// Reference articles shown during the plausibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub source: ReferenceSource,

    #[serde(default = "default_reference_timeout")]
    pub timeout_secs: u64,
}

fn default_reference_timeout() -> u64 {
    20
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            source: ReferenceSource::default(),
            timeout_secs: default_reference_timeout(),
        }
    }
}

/// Optional chat assistant (OpenAI-compatible endpoint, e.g. local Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Questions per disease before the assessment (valid: 1-8)
    #[serde(default = "default_assistant_questions")]
    pub max_questions: u32,

    #[serde(default = "default_assistant_timeout")]
    pub timeout_secs: u64,

    /// Name of the environment variable holding the API key, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_assistant_questions() -> u32 {
    3
}

fn default_assistant_timeout() -> u64 {
    120
}

impl AssistantConfig {
    pub fn effective_max_questions(&self) -> u32 {
        self.max_questions.clamp(1, 8)
    }

    /// API key read from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.is_empty())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            model: default_model(),
            max_questions: default_assistant_questions(),
            timeout_secs: default_assistant_timeout(),
            api_key_env: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymcheckConfig {
    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub reference: ReferenceConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl SymcheckConfig {
    /// Load from `path`. A missing file yields defaults; an unreadable or
    /// unparsable one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SymcheckError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Config file path: `$SYMCHECK_CONFIG` if set, else the per-user config dir.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}
