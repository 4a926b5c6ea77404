//! Configuration types and loading for ragbridge.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::error::Result;
use crate::models::{AssistantSpec, Tool};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hosted backend connection settings.
    pub backend: BackendConfig,

    /// Assistant created at every process start.
    pub assistant: AssistantConfig,

    /// Knowledge corpus and the document uploaded into it.
    pub corpus: CorpusConfig,

    /// Polling bounds for runs and document binds.
    pub polling: PollingConfig,

    /// WebSocket server settings.
    pub server: ServerConfig,

    /// Fixed texts sent to clients instead of an answer.
    pub notices: NoticesConfig,
}

impl Config {
    /// Load configuration from the default config file.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_config_path())
    }

    /// Load configuration from a specific file, then apply environment
    /// overrides (`RAGBRIDGE__SECTION__KEY`).
    ///
    /// A missing file is not an error; defaults fill every absent key.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix(&crate::env_prefix())
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(format!("Failed to load config: {e}")))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_NAME)
            .join("config.toml")
    }

    /// Save configuration to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Ensure config exists at the given path, creating defaults if missing.
    pub fn ensure_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::default().save_to_path(path)?;
        }
        Self::load_from_path(path)
    }

    /// Expand a path, replacing ~ with home directory.
    pub fn expand_path(path: &str) -> PathBuf {
        let expanded = shellexpand::full(path)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| path.to_string());
        PathBuf::from(expanded)
    }

    fn expand_paths(&mut self) {
        self.corpus.document = Self::expand_path(&self.corpus.document.to_string_lossy());
    }

    /// Reject settings that would make the bridge unusable.
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(Error::Config("backend.base_url must not be empty".into()));
        }
        if self.assistant.model.trim().is_empty() {
            return Err(Error::Config("assistant.model must not be empty".into()));
        }
        for (name, policy) in [("run", &self.polling.run), ("bind", &self.polling.bind)] {
            if policy.max_attempts == 0 {
                return Err(Error::Config(format!(
                    "polling.{name}.max_attempts must be > 0"
                )));
            }
        }
        Ok(())
    }

    /// Read the backend credential from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.backend.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(format!(
                "{var} environment variable not set"
            ))),
        }
    }

    /// Assistant creation request built from the assistant section.
    pub fn assistant_spec(&self) -> AssistantSpec {
        AssistantSpec {
            name: self.assistant.name.clone(),
            instructions: self.assistant.instructions.clone(),
            model: self.assistant.model.clone(),
            tools: vec![Tool::FileSearch],
        }
    }
}

/// Hosted backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// API base URL, including the version segment.
    pub base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Assistant created at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub name: String,
    pub instructions: String,
    pub model: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "Real-Time AI Assistant".to_string(),
            instructions: "You are a chatbot that answers user questions using vector store \
                files. If the user asks a factual question, always use File Search to find \
                the answer."
                .to_string(),
            model: "gpt-4o".to_string(),
        }
    }
}

/// Knowledge corpus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Display name used when a corpus has to be created.
    pub name: String,

    /// Local document uploaded into an empty corpus.
    pub document: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            name: "Knowledge Base".to_string(),
            document: PathBuf::from("knowledge_base.txt"),
        }
    }
}

/// Polling bounds, one policy per kind of backend job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub run: PollPolicyConfig,
    pub bind: PollPolicyConfig,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            run: PollPolicyConfig {
                interval_ms: 500,
                max_attempts: 600,
                max_wait_secs: 300,
            },
            bind: PollPolicyConfig {
                interval_ms: 1000,
                max_attempts: 600,
                max_wait_secs: 600,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicyConfig {
    /// Delay between status checks in milliseconds.
    pub interval_ms: u64,

    /// Maximum number of status checks.
    pub max_attempts: u32,

    /// Wall-clock limit in seconds.
    pub max_wait_secs: u64,
}

impl Default for PollPolicyConfig {
    fn default() -> Self {
        PollingConfig::default().run
    }
}

/// How frames arriving on one connection are scheduled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrdering {
    /// Every frame runs independently; replies may arrive out of order.
    #[default]
    Concurrent,
    /// One frame at a time per connection; replies keep request order.
    Serial,
}

/// WebSocket server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ordering: MessageOrdering,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ordering: MessageOrdering::Concurrent,
        }
    }
}

/// Fixed notices returned instead of an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticesConfig {
    /// Sent while setup has not finished.
    pub initializing: String,

    /// Sent when the request pipeline fails.
    pub error: String,
}

impl Default for NoticesConfig {
    fn default() -> Self {
        Self {
            initializing: "⚠️ Assistant is still being initialized. Please wait...".to_string(),
            error: "⚠️ Error communicating with the assistant. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
