pub mod providers;
pub mod dispatcher;
pub mod json;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use dispatcher::{GenerationMode, GenerationOutcome, GenerationRequest, HybridDispatcher};
pub use providers::{GeminiProvider, OllamaProvider};

/// LLM backend types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProvider {
    Ollama,
    Gemini,
}

/// Rule governing which backend(s) the dispatcher may try, and in what order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Local backend only, never substituted
    Local,
    /// Cloud backend only, never substituted
    Cloud,
    /// Local first when reachable, cloud as failover
    #[default]
    Auto,
}

impl FromStr for PolicyMode {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(PolicyMode::Local),
            "cloud" => Ok(PolicyMode::Cloud),
            "auto" => Ok(PolicyMode::Auto),
            other => Err(LLMError::Configuration(format!(
                "unknown AI provider policy '{}' (expected local, cloud or auto)",
                other
            ))),
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyMode::Local => write!(f, "local"),
            PolicyMode::Cloud => write!(f, "cloud"),
            PolicyMode::Auto => write!(f, "auto"),
        }
    }
}

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Error types for LLM operations
#[derive(thiserror::Error, Debug)]
pub enum LLMError {
    #[error("Provider not available: {0}")]
    BackendUnavailable(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Provider returned invalid JSON: {0}")]
    InvalidStructuredOutput(String),

    #[error("All AI providers failed. Last error: {last_error}")]
    AllProvidersExhausted { last_error: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LLM: Send + Sync {
    /// Human-readable label, e.g. "Local (gemma3:4b)"
    fn name(&self) -> String;

    fn provider_type(&self) -> LLMProvider;

    /// Cheap connectivity/credential check. Never fails; false on any error.
    async fn probe_availability(&self) -> bool;

    /// Cached availability, re-probed where the backend can come up later
    async fn is_available(&self) -> bool;

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String>;

    /// Ask for JSON output. The result is not guaranteed to be well-formed.
    async fn generate_structured(&self, prompt: &str, system_prompt: &str) -> Result<String>;
}

/// Instruction appended to prompts for backends without a native JSON mode
pub const JSON_ONLY_INSTRUCTION: &str = "\n\nCRITICAL: RESPONSE MUST BE VALID MINIFIED JSON. NO MARKDOWN.";

/// Fold a system instruction into the prompt for backends that take a single input
pub fn merge_system_prompt(system_prompt: &str, prompt: &str) -> String {
    if system_prompt.is_empty() {
        prompt.to_string()
    } else {
        format!("{}\n\n{}", system_prompt, prompt)
    }
}
