//! Configuration settings for Vidask.

use crate::chunking::{DEFAULT_QA_CHUNK_TOKENS, DEFAULT_SUMMARY_CHUNK_TOKENS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub qa: QaSettings,
    pub summary: SummarySettings,
    pub cache: CacheSettings,
    pub youtube: YoutubeSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vidask".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Language model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    /// API key. OPENAI_API_KEY replaces it when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Chat model used for every completion call.
    pub model: String,
    /// Per-call HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Retries for transient completion failures (0 disables retrying).
    pub max_retries: u32,
    /// Base delay between retries; grows linearly with the attempt number.
    pub retry_base_delay_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 300,
            max_retries: 2,
            retry_base_delay_ms: 500,
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Whether an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }
}

/// Question-answering pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaSettings {
    /// Estimated token budget per transcript chunk.
    pub max_chunk_tokens: usize,
    /// Chunks probed at once. 1 probes strictly one after another.
    pub max_concurrent_probes: usize,
    /// Deadline for a whole question, covering every chunk probe and the synthesis call.
    pub request_timeout_secs: u64,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            max_chunk_tokens: DEFAULT_QA_CHUNK_TOKENS,
            max_concurrent_probes: 1,
            request_timeout_secs: 180,
        }
    }
}

impl QaSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Summary pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Estimated token budget per transcript chunk.
    pub max_chunk_tokens: usize,
    /// How long a computed summary stays cached.
    pub cache_ttl_hours: u64,
    /// Deadline for a whole summary request in seconds.
    pub request_timeout_secs: u64,
    /// Model override for summaries (defaults to `llm.model`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            max_chunk_tokens: DEFAULT_SUMMARY_CHUNK_TOKENS,
            cache_ttl_hours: 24 * 7,
            request_timeout_secs: 600,
            model: None,
        }
    }
}

impl SummarySettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 60 * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Summary cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache provider (sqlite, memory, none).
    pub provider: String,
    /// Path to the SQLite cache database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.vidask/cache.db".to_string(),
        }
    }
}

/// YouTube-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Preferred caption languages, in order.
    pub languages: Vec<String>,
    /// yt-dlp executable.
    pub ytdlp_path: String,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            ytdlp_path: "yt-dlp".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied once here; nothing downstream reads the environment.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply OPENAI_API_KEY, OPENAI_API_ENDPOINT and OPENAI_MODEL_NAME overrides.
    ///
    /// Environment values take precedence over file values. Blank variables are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty("OPENAI_API_ENDPOINT") {
            self.llm.api_base = endpoint;
        }
        if let Some(model) = non_empty("OPENAI_MODEL_NAME") {
            self.llm.model = model;
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut persisted = self.clone();
        // Keys picked up from the environment never land on disk.
        persisted.llm.api_key = None;
        let content = toml::to_string_pretty(&persisted)
            .map_err(|e| crate::error::VidaskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidask")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite cache path.
    pub fn cache_path(&self) -> PathBuf {
        Self::expand_path(&self.cache.sqlite_path)
    }

    /// Model used for summaries.
    pub fn summary_model(&self) -> &str {
        self.summary.model.as_deref().unwrap_or(&self.llm.model)
    }
}
