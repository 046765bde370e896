use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::llm::PolicyMode;

/// Configuration for TEF Master
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider policy and search settings
    pub ai: AiConfig,

    /// Local backend (Ollama) settings
    pub local: LocalConfig,

    /// Cloud backend (Google Generative Language API) settings
    pub cloud: CloudConfig,

    /// Web search settings
    pub search: SearchConfig,

    /// Optional feature switches
    pub features: FeatureFlags,

    /// XP rewards and unlock thresholds
    pub gamification: GamificationConfig,

    /// Progress persistence settings
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Which backend(s) may be used: local, cloud or auto
    pub policy: PolicyMode,

    /// Allow prompts to be augmented with web search context
    pub search_enabled: bool,

    /// Number of search results folded into an augmented prompt
    pub search_max_results: usize,
}

/// Locally hosted model served by Ollama
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Ollama server base URL
    pub base_url: String,

    /// Model tag to run
    pub model: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Sampling temperature for free-text generation
    pub temperature: f32,
}

/// Cloud model served by the Google Generative Language API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Model name (Gemini or Gemma family)
    pub model: String,

    /// API key; when absent the key is read from `api_key_env_var`
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env_var: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Sampling temperature
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTML search endpoint
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Voice tutor (speech practice) module
    pub voice_tutor: bool,
}

/// XP values per activity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationConfig {
    pub xp_per_grammar_question: i64,
    pub xp_per_reading_question: i64,
    pub xp_per_writing_submission: i64,
    pub xp_per_voice_practice: i64,
    pub xp_per_search_query: i64,

    /// Questions a learner is expected to complete before moving on
    pub questions_to_unlock_week: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding XP history, streaks, progress and favorites
    pub progress_file: PathBuf,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let mut config_paths = vec![
            PathBuf::from("tef-master.toml"),
            PathBuf::from("config/tef-master.toml"),
        ];
        if let Ok(home) = std::env::var("HOME") {
            config_paths.push(PathBuf::from(home).join(".config/tef-master/config.toml"));
        }

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(policy) = std::env::var("TEF_AI_PROVIDER") {
            config.ai.policy = policy.parse()?;
        }

        if let Ok(enabled) = std::env::var("TEF_SEARCH_ENABLED") {
            config.ai.search_enabled = matches!(enabled.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        if let Ok(url) = std::env::var("TEF_OLLAMA_URL") {
            config.local.base_url = url;
        }

        if let Ok(model) = std::env::var("TEF_OLLAMA_MODEL") {
            config.local.model = model;
        }

        if let Ok(model) = std::env::var("TEF_GEMINI_MODEL") {
            config.cloud.model = model;
        }

        if let Ok(path) = std::env::var("TEF_PROGRESS_FILE") {
            config.storage.progress_file = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.local.base_url.trim().is_empty() {
            return Err(anyhow!("local.base_url must not be empty"));
        }

        if self.local.model.trim().is_empty() || self.cloud.model.trim().is_empty() {
            return Err(anyhow!("model names must not be empty"));
        }

        if self.ai.search_enabled && self.ai.search_max_results == 0 {
            return Err(anyhow!("search_max_results must be greater than 0 when search is enabled"));
        }

        if self.local.timeout_seconds == 0 || self.cloud.timeout_seconds == 0 {
            return Err(anyhow!("timeouts must be greater than 0"));
        }

        if self.ai.policy == PolicyMode::Cloud && self.cloud_api_key().is_none() {
            tracing::warn!(
                "Policy is 'cloud' but no API key is set (config or {}); AI requests will fail",
                self.cloud.api_key_env_var
            );
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// API key for the cloud backend, from config first and then the environment
    pub fn cloud_api_key(&self) -> Option<String> {
        self.cloud
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var(&self.cloud.api_key_env_var)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "TEF Master Configuration:\n\
            - AI Policy: {:?}\n\
            - Local Model: {} @ {}\n\
            - Cloud Model: {} (key {})\n\
            - Internet Search: {}\n\
            - Voice Tutor: {}\n\
            - Progress File: {}",
            self.ai.policy,
            self.local.model,
            self.local.base_url,
            self.cloud.model,
            if self.cloud_api_key().is_some() { "set" } else { "missing" },
            if self.ai.search_enabled { "enabled" } else { "disabled" },
            if self.features.voice_tutor { "enabled" } else { "disabled" },
            self.storage.progress_file.display()
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai: AiConfig {
                policy: PolicyMode::Auto,
                search_enabled: true,
                search_max_results: 3,
            },
            local: LocalConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "gemma3:4b".to_string(),
                timeout_seconds: 120,
                temperature: 0.7,
            },
            cloud: CloudConfig {
                model: "gemma-3-27b-it".to_string(),
                api_key: None,
                api_key_env_var: "GEMINI_API_KEY".to_string(),
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                timeout_seconds: 60,
                temperature: 0.7,
            },
            search: SearchConfig {
                endpoint: "https://html.duckduckgo.com/html/".to_string(),
                timeout_seconds: 10,
            },
            features: FeatureFlags { voice_tutor: false },
            gamification: GamificationConfig {
                xp_per_grammar_question: 10,
                xp_per_reading_question: 15,
                xp_per_writing_submission: 50,
                xp_per_voice_practice: 20,
                xp_per_search_query: 5,
                questions_to_unlock_week: 20,
            },
            storage: StorageConfig {
                progress_file: PathBuf::from("data/progress.json"),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_policy(mut self, policy: PolicyMode) -> Self {
        self.config.ai.policy = policy;
        self
    }

    pub fn with_search(mut self, enabled: bool) -> Self {
        self.config.ai.search_enabled = enabled;
        self
    }

    pub fn with_local_endpoint(mut self, base_url: String) -> Self {
        self.config.local.base_url = base_url;
        self
    }

    pub fn with_local_model(mut self, model: String) -> Self {
        self.config.local.model = model;
        self
    }

    pub fn with_cloud_model(mut self, model: String) -> Self {
        self.config.cloud.model = model;
        self
    }

    pub fn with_cloud_endpoint(mut self, base_url: String) -> Self {
        self.config.cloud.base_url = base_url;
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.cloud.api_key = Some(api_key);
        self
    }

    pub fn with_progress_file(mut self, path: PathBuf) -> Self {
        self.config.storage.progress_file = path;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
