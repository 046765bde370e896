use super::{merge_system_prompt, ChatMessage, LLMError, LLMProvider, Result, JSON_ONLY_INSTRUCTION, LLM};
use crate::config::{CloudConfig, LocalConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Temperature used for Ollama's native JSON mode
const OLLAMA_JSON_TEMPERATURE: f32 = 0.2;

/// Ollama (local) provider implementation
pub struct OllamaProvider {
    config: LocalConfig,
    client: reqwest::Client,
    available: AtomicBool,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

impl OllamaProvider {
    pub fn new(config: LocalConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            client,
            available: AtomicBool::new(false),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn build_messages(prompt: &str, system_prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::system(system_prompt));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }

    async fn chat(&self, messages: &[ChatMessage], format: Option<&str>, temperature: f32) -> Result<String> {
        let endpoint = self.endpoint("/api/chat");
        let request = OllamaChatRequest {
            model: &self.config.model,
            messages,
            stream: false,
            format,
            options: OllamaOptions { temperature },
        };

        debug!("Sending request to Ollama at {} (format: {:?})", endpoint, format);

        let response = self.client.post(&endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LLMError::Backend(format!("Ollama API error {}: {}", status, text)));
        }

        let chat_response: OllamaChatResponse = response.json().await?;
        let content = chat_response.message.content;

        if content.trim().is_empty() {
            return Err(LLMError::Backend("Empty response from Ollama".to_string()));
        }

        Ok(content)
    }
}

#[async_trait]
impl LLM for OllamaProvider {
    fn name(&self) -> String {
        format!("Local ({})", self.config.model)
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Ollama
    }

    async fn probe_availability(&self) -> bool {
        match self.client.get(self.endpoint("/api/tags")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Ollama probe failed: {}", e);
                false
            }
        }
    }

    async fn is_available(&self) -> bool {
        // The service may have been started since the last check
        if !self.available.load(Ordering::Acquire) {
            let reachable = self.probe_availability().await;
            self.available.store(reachable, Ordering::Release);
            if !reachable {
                debug!("{} is not reachable", self.name());
            }
        }
        self.available.load(Ordering::Acquire)
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let messages = Self::build_messages(prompt, system_prompt);
        self.chat(&messages, None, self.config.temperature).await
    }

    async fn generate_structured(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let prompt = format!("{}{}", prompt, JSON_ONLY_INSTRUCTION);
        let messages = Self::build_messages(&prompt, system_prompt);

        match self.chat(&messages, Some("json"), OLLAMA_JSON_TEMPERATURE).await {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!("Ollama JSON mode failed ({}), retrying without format", e);
                self.chat(&messages, None, self.config.temperature).await
            }
        }
    }
}

/// Gemini (cloud) provider implementation
pub struct GeminiProvider {
    config: CloudConfig,
    api_key: Option<String>,
    client: reqwest::Client,
    available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiProvider {
    /// Create the provider. Availability is fixed here from key presence.
    pub fn new(config: CloudConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let available = api_key.is_some();
        if !available {
            debug!("No API key for {}, cloud provider disabled", config.model);
        }

        Ok(Self {
            config,
            api_key,
            client,
            available,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Gemma models accept neither a system instruction nor a JSON mime type
    fn is_gemma(&self) -> bool {
        self.config.model.to_lowercase().contains("gemma")
    }

    fn build_request(&self, prompt: &str, system_prompt: &str, json_mode: bool) -> GeminiRequest {
        let (text, system_instruction, response_mime_type) = if self.is_gemma() {
            let mut text = merge_system_prompt(system_prompt, prompt);
            if json_mode {
                text.push_str(JSON_ONLY_INSTRUCTION);
            }
            (text, None, None)
        } else {
            let system_instruction = (!system_prompt.is_empty()).then(|| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system_prompt.to_string(),
                }],
            });
            let mime = json_mode.then(|| "application/json".to_string());
            (prompt.to_string(), system_instruction, mime)
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text }],
            }],
            system_instruction,
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                response_mime_type,
            },
        }
    }

    async fn generate_content(&self, prompt: &str, system_prompt: &str, json_mode: bool) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LLMError::Backend("Gemini API not configured".to_string()))?;

        let request = self.build_request(prompt, system_prompt, json_mode);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        debug!("Sending request to Gemini API (model: {}, json: {})", self.config.model, json_mode);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.as_str())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LLMError::Backend(format!("Gemini API error {}: {}", status, text)));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let content = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect::<String>())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LLMError::Backend("No response from Gemini".to_string()))?;

        Ok(content)
    }
}

#[async_trait]
impl LLM for GeminiProvider {
    fn name(&self) -> String {
        format!("Cloud ({})", self.config.model)
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Gemini
    }

    async fn probe_availability(&self) -> bool {
        self.api_key.is_some()
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        self.generate_content(prompt, system_prompt, false).await
    }

    async fn generate_structured(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        if self.api_key.is_none() {
            return Err(LLMError::Backend("Gemini API not configured".to_string()));
        }

        match self.generate_content(prompt, system_prompt, true).await {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!("Gemini JSON mode failed ({}), retrying as free text", e);
                self.generate_content(prompt, system_prompt, false).await
            }
        }
    }
}
