//! Hybrid dispatch across the local and cloud backends
//!
//! The dispatcher orders the two providers according to the configured
//! [`PolicyMode`], optionally augments the prompt with web search context,
//! and walks the candidates one at a time until one of them produces a
//! response that passes validation for the requested mode.

use super::json::{strip_code_fences, validate_json};
use super::{GeminiProvider, LLMError, OllamaProvider, PolicyMode, Result, LLM};
use crate::config::Config;
use crate::search::SearchAugmenter;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Number of prompt characters used as the web search query
const SEARCH_QUERY_CHARS: usize = 100;

/// Output shape requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Text,
    Json,
}

/// A single generation request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub mode: GenerationMode,
    pub use_search: bool,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: String::new(),
            mode: GenerationMode::Text,
            use_search: false,
        }
    }

    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            mode: GenerationMode::Json,
            ..Self::text(prompt)
        }
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_search(mut self, use_search: bool) -> Self {
        self.use_search = use_search;
        self
    }
}

/// Result of a dispatch, successful only if the payload passed validation
#[derive(Debug)]
pub enum GenerationOutcome {
    Success {
        content: String,
        provider: String,
        attempts: usize,
    },
    Failure {
        error: LLMError,
        attempts: usize,
    },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }

    /// Number of providers actually invoked (skipped candidates excluded)
    pub fn attempts(&self) -> usize {
        match self {
            GenerationOutcome::Success { attempts, .. } | GenerationOutcome::Failure { attempts, .. } => *attempts,
        }
    }

    pub fn provider(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Success { provider, .. } => Some(provider),
            GenerationOutcome::Failure { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<String> {
        match self {
            GenerationOutcome::Success { content, .. } => Ok(content),
            GenerationOutcome::Failure { error, .. } => Err(error),
        }
    }

    /// Content on success, or a displayable `Error: ...` line
    pub fn into_text(self) -> String {
        match self {
            GenerationOutcome::Success { content, .. } => content,
            GenerationOutcome::Failure { error, .. } => format!("Error: {}", error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Local,
    Cloud,
}

/// Routes generation requests to the local or cloud backend with failover
pub struct HybridDispatcher {
    local: Box<dyn LLM>,
    cloud: Box<dyn LLM>,
    policy: PolicyMode,
    augmenter: SearchAugmenter,
}

impl HybridDispatcher {
    pub fn new(local: Box<dyn LLM>, cloud: Box<dyn LLM>, policy: PolicyMode, augmenter: SearchAugmenter) -> Self {
        Self {
            local,
            cloud,
            policy,
            augmenter,
        }
    }

    /// Build both providers and the search augmenter from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let local = OllamaProvider::new(config.local.clone())?;
        let cloud = GeminiProvider::new(config.cloud.clone(), config.cloud_api_key())?;
        let augmenter = SearchAugmenter::from_config(config)?;

        info!(
            "🔀 Dispatcher ready (policy: {}, search: {})",
            config.ai.policy,
            if augmenter.is_enabled() { "on" } else { "off" }
        );

        Ok(Self::new(Box::new(local), Box::new(cloud), config.ai.policy, augmenter))
    }

    pub fn policy(&self) -> PolicyMode {
        self.policy
    }

    fn provider(&self, slot: Slot) -> &dyn LLM {
        match slot {
            Slot::Local => self.local.as_ref(),
            Slot::Cloud => self.cloud.as_ref(),
        }
    }

    /// Provider ordering for the configured policy
    async fn candidates(&self) -> Result<Vec<Slot>> {
        match self.policy {
            PolicyMode::Local => {
                if self.local.is_available().await {
                    Ok(vec![Slot::Local])
                } else {
                    Err(LLMError::BackendUnavailable(self.local.name()))
                }
            }
            PolicyMode::Cloud => {
                if self.cloud.is_available().await {
                    Ok(vec![Slot::Cloud])
                } else {
                    Err(LLMError::BackendUnavailable(self.cloud.name()))
                }
            }
            PolicyMode::Auto => {
                if self.local.is_available().await {
                    Ok(vec![Slot::Local, Slot::Cloud])
                } else {
                    Ok(vec![Slot::Cloud])
                }
            }
        }
    }

    /// Prepend search context to the prompt when requested and available
    async fn augment(&self, request: &GenerationRequest) -> String {
        if !request.use_search || !self.augmenter.is_enabled() {
            return request.prompt.clone();
        }

        let query: String = request.prompt.chars().take(SEARCH_QUERY_CHARS).collect();
        let context = self
            .augmenter
            .fetch_context(&query, self.augmenter.max_results())
            .await;

        if context.is_empty() {
            debug!("No search context, using original prompt");
            request.prompt.clone()
        } else {
            format!("Context from Internet:\n{}\n\nUser Question:\n{}", context, request.prompt)
        }
    }

    /// Sequential failover loop shared by every dispatch flavour.
    ///
    /// `accept` sees the raw text in text mode and the fence-stripped,
    /// parse-checked text in JSON mode. Any error it returns moves the loop
    /// on to the next candidate.
    async fn run<T, F>(&self, request: &GenerationRequest, accept: F) -> (Result<(T, String)>, usize)
    where
        F: Fn(String) -> Result<T>,
    {
        let order = match self.candidates().await {
            Ok(order) => order,
            Err(e) => {
                warn!("⚠️ {} (policy: {})", e, self.policy);
                return (Err(e), 0);
            }
        };

        let prompt = self.augment(request).await;
        let total = order.len();
        let mut attempts = 0;
        let mut last_error: Option<LLMError> = None;

        for (index, slot) in order.into_iter().enumerate() {
            let provider = self.provider(slot);
            let name = provider.name();

            if index > 0 && total > 1 && !provider.is_available().await {
                debug!("Skipping {}: not available", name);
                last_error.get_or_insert(LLMError::BackendUnavailable(name));
                continue;
            }

            attempts += 1;
            debug!("Attempt {} with {} ({:?} mode)", attempts, name, request.mode);

            let result = match request.mode {
                GenerationMode::Text => provider
                    .generate_text(&prompt, &request.system_prompt)
                    .await
                    .and_then(&accept),
                GenerationMode::Json => provider
                    .generate_structured(&prompt, &request.system_prompt)
                    .await
                    .and_then(|raw| {
                        let cleaned = strip_code_fences(&raw);
                        validate_json(&cleaned)?;
                        accept(cleaned)
                    }),
            };

            match result {
                Ok(value) => {
                    info!("✅ {} answered after {} attempt(s)", name, attempts);
                    return (Ok((value, name)), attempts);
                }
                Err(e) => {
                    warn!("⚠️ {} failed: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no provider was attempted".to_string());

        (Err(LLMError::AllProvidersExhausted { last_error }), attempts)
    }

    /// Generate with failover. Never panics and never propagates an error:
    /// failures are returned inside the outcome.
    pub async fn dispatch(&self, request: &GenerationRequest) -> GenerationOutcome {
        match self.run(request, Ok).await {
            (Ok((content, provider)), attempts) => GenerationOutcome::Success {
                content,
                provider,
                attempts,
            },
            (Err(error), attempts) => GenerationOutcome::Failure { error, attempts },
        }
    }

    /// Structured generation that must also deserialize into `T`.
    /// A shape mismatch fails over like a parse failure.
    pub async fn dispatch_json<T: DeserializeOwned>(&self, request: &GenerationRequest) -> Result<T> {
        let request = GenerationRequest {
            mode: GenerationMode::Json,
            ..request.clone()
        };

        let (result, _) = self
            .run(&request, |cleaned| {
                serde_json::from_str::<T>(&cleaned)
                    .map_err(|e| LLMError::InvalidStructuredOutput(format!("unexpected shape: {}", e)))
            })
            .await;

        result.map(|(value, _)| value)
    }

    /// Label of the provider the policy would try first, if any is reachable
    pub async fn active_provider(&self) -> Option<String> {
        match self.policy {
            PolicyMode::Local => self.local.is_available().await.then(|| self.local.name()),
            PolicyMode::Cloud => self.cloud.is_available().await.then(|| self.cloud.name()),
            PolicyMode::Auto => {
                if self.local.is_available().await {
                    Some(self.local.name())
                } else if self.cloud.is_available().await {
                    Some(self.cloud.name())
                } else {
                    None
                }
            }
        }
    }

    /// One-line connection status for display
    pub async fn status(&self) -> String {
        match self.active_provider().await {
            Some(name) => format!("Connected: {}", name),
            None => "No AI Connected (Start Ollama or set API Key)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMProvider;
    use crate::search::{SearchBackend, SearchResult};
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakeProvider {
        label: &'static str,
        available: bool,
        reply: std::result::Result<&'static str, &'static str>,
        calls: Arc<AtomicUsize>,
        last_prompt: Arc<Mutex<Option<String>>>,
    }

    impl FakeProvider {
        fn new(label: &'static str, available: bool, reply: std::result::Result<&'static str, &'static str>) -> Self {
            Self {
                label,
                available,
                reply,
                calls: Arc::new(AtomicUsize::new(0)),
                last_prompt: Arc::new(Mutex::new(None)),
            }
        }

        fn respond(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply
                .map(str::to_string)
                .map_err(|e| LLMError::Backend(e.to_string()))
        }
    }

    #[async_trait]
    impl LLM for FakeProvider {
        fn name(&self) -> String {
            self.label.to_string()
        }

        fn provider_type(&self) -> LLMProvider {
            LLMProvider::Ollama
        }

        async fn probe_availability(&self) -> bool {
            self.available
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn generate_text(&self, prompt: &str, _system_prompt: &str) -> Result<String> {
            self.respond(prompt)
        }

        async fn generate_structured(&self, prompt: &str, _system_prompt: &str) -> Result<String> {
            self.respond(prompt)
        }
    }

    struct FixedSearch(anyhow::Result<Vec<SearchResult>>);

    #[async_trait]
    impl SearchBackend for FixedSearch {
        async fn search(&self, _query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
            match &self.0 {
                Ok(results) => Ok(results.iter().take(max_results).cloned().collect()),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }
    }

    /// Returns one fixed result and keeps the last query it saw
    struct RecordingSearch(Arc<Mutex<Option<String>>>);

    #[async_trait]
    impl SearchBackend for RecordingSearch {
        async fn search(&self, query: &str, _max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
            *self.0.lock().unwrap() = Some(query.to_string());
            Ok(vec![SearchResult {
                title: "Accord du participe passé".to_string(),
                url: "https://example.org/accord".to_string(),
                summary: "Règles".to_string(),
            }])
        }
    }

    struct Harness {
        dispatcher: HybridDispatcher,
        local_calls: Arc<AtomicUsize>,
        cloud_calls: Arc<AtomicUsize>,
        local_prompt: Arc<Mutex<Option<String>>>,
    }

    fn harness(policy: PolicyMode, local: FakeProvider, cloud: FakeProvider, augmenter: SearchAugmenter) -> Harness {
        let local_calls = local.calls.clone();
        let cloud_calls = cloud.calls.clone();
        let local_prompt = local.last_prompt.clone();
        Harness {
            dispatcher: HybridDispatcher::new(Box::new(local), Box::new(cloud), policy, augmenter),
            local_calls,
            cloud_calls,
            local_prompt,
        }
    }

    #[tokio::test]
    async fn test_forced_local_never_touches_cloud() {
        let h = harness(
            PolicyMode::Local,
            FakeProvider::new("Local", true, Err("boom")),
            FakeProvider::new("Cloud", true, Ok("OK")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::text("hi")).await;
        assert!(!outcome.is_success());
        assert_eq!(h.local_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.cloud_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forced_cloud_never_touches_local() {
        let h = harness(
            PolicyMode::Cloud,
            FakeProvider::new("Local", true, Ok("local")),
            FakeProvider::new("Cloud", true, Err("quota")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::text("hi")).await;
        assert!(!outcome.is_success());
        assert_eq!(h.local_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.cloud_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forced_policy_with_backend_down_is_unavailable() {
        let h = harness(
            PolicyMode::Local,
            FakeProvider::new("Local", false, Ok("unused")),
            FakeProvider::new("Cloud", true, Ok("OK")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::text("hi")).await;
        assert_eq!(outcome.attempts(), 0);
        assert!(matches!(
            outcome.into_result(),
            Err(LLMError::BackendUnavailable(ref name)) if name == "Local"
        ));
        assert_eq!(h.cloud_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auto_fails_over_to_cloud() {
        let h = harness(
            PolicyMode::Auto,
            FakeProvider::new("Local", true, Err("connection reset")),
            FakeProvider::new("Cloud", true, Ok("OK")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::text("hi")).await;
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(outcome.provider(), Some("Cloud"));
        assert_eq!(outcome.into_result().unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_auto_with_local_down_goes_straight_to_cloud() {
        let h = harness(
            PolicyMode::Auto,
            FakeProvider::new("Local", false, Ok("local")),
            FakeProvider::new("Cloud", true, Ok("cloud")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::text("hi")).await;
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(outcome.into_text(), "cloud");
        assert_eq!(h.local_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_cloud_is_skipped_after_local_failure() {
        let h = harness(
            PolicyMode::Auto,
            FakeProvider::new("Local", true, Err("model crashed")),
            FakeProvider::new("Cloud", false, Ok("unused")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::text("hi")).await;
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(h.cloud_calls.load(Ordering::SeqCst), 0);

        let text = outcome.into_text();
        assert!(text.starts_with("Error: All AI providers failed."));
        assert!(text.contains("model crashed"));
    }

    #[tokio::test]
    async fn test_auto_with_both_down_still_tries_cloud() {
        let h = harness(
            PolicyMode::Auto,
            FakeProvider::new("Local", false, Ok("unused")),
            FakeProvider::new("Cloud", false, Err("Gemini API not configured")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::text("hi")).await;
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(h.local_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.cloud_calls.load(Ordering::SeqCst), 1);
        match outcome.into_result() {
            Err(LLMError::AllProvidersExhausted { last_error }) => {
                assert!(last_error.contains("Gemini API not configured"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_never_success() {
        let h = harness(
            PolicyMode::Local,
            FakeProvider::new("Local", true, Ok("not json")),
            FakeProvider::new("Cloud", true, Ok("{}")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::json("give json")).await;
        assert!(!outcome.is_success());
        match outcome.into_result() {
            Err(LLMError::AllProvidersExhausted { last_error }) => {
                assert!(last_error.contains("invalid JSON"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_fails_over_in_auto() {
        let h = harness(
            PolicyMode::Auto,
            FakeProvider::new("Local", true, Ok("Sure! Here is your JSON")),
            FakeProvider::new("Cloud", true, Ok("```json\n{\"a\":1}\n```")),
            SearchAugmenter::disabled(),
        );

        let outcome = h.dispatcher.dispatch(&GenerationRequest::json("give json")).await;
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(outcome.into_result().unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_dispatch_json_rejects_wrong_shape() {
        #[derive(Debug, Deserialize)]
        struct Item {
            #[allow(dead_code)]
            question: String,
        }

        let h = harness(
            PolicyMode::Auto,
            FakeProvider::new("Local", true, Ok("{\"unexpected\":true}")),
            FakeProvider::new("Cloud", true, Ok("[{\"question\":\"Q1\"}]")),
            SearchAugmenter::disabled(),
        );

        let items: Vec<Item> = h
            .dispatcher
            .dispatch_json(&GenerationRequest::json("items"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(h.local_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.cloud_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_search_matches_no_augmentation() {
        let failing = SearchAugmenter::new(Box::new(FixedSearch(Err(anyhow::anyhow!("offline")))), 3);
        let h = harness(
            PolicyMode::Local,
            FakeProvider::new("Local", true, Ok("answer")),
            FakeProvider::new("Cloud", true, Ok("unused")),
            failing,
        );

        let request = GenerationRequest::text("Explain the subjonctif").with_search(true);
        let outcome = h.dispatcher.dispatch(&request).await;

        assert_eq!(outcome.into_text(), "answer");
        assert_eq!(
            h.local_prompt.lock().unwrap().as_deref(),
            Some("Explain the subjonctif")
        );
    }

    #[tokio::test]
    async fn test_search_context_is_prepended() {
        let results = vec![SearchResult {
            title: "Le subjonctif".to_string(),
            url: "https://example.org/subj".to_string(),
            summary: "Mode verbal".to_string(),
        }];
        let augmenter = SearchAugmenter::new(Box::new(FixedSearch(Ok(results))), 3);
        let h = harness(
            PolicyMode::Local,
            FakeProvider::new("Local", true, Ok("answer")),
            FakeProvider::new("Cloud", true, Ok("unused")),
            augmenter,
        );

        let request = GenerationRequest::text("Explain the subjonctif").with_search(true);
        h.dispatcher.dispatch(&request).await;

        let prompt = h.local_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("Context from Internet:\n- Title: Le subjonctif"));
        assert!(prompt.ends_with("User Question:\nExplain the subjonctif"));
    }

    #[tokio::test]
    async fn test_search_query_is_first_hundred_chars() {
        let seen = Arc::new(Mutex::new(None));
        let augmenter = SearchAugmenter::new(Box::new(RecordingSearch(seen.clone())), 3);
        let h = harness(
            PolicyMode::Local,
            FakeProvider::new("Local", true, Ok("answer")),
            FakeProvider::new("Cloud", true, Ok("unused")),
            augmenter,
        );

        let prompt = "Expliquez l'accord du participe passé avec « être » et « avoir », \
                      puis donnez des exemples tirés de la vie quotidienne à Montréal, s'il vous plaît.";
        assert!(prompt.chars().count() > 100);
        assert!(prompt.len() > prompt.chars().count());

        h.dispatcher
            .dispatch(&GenerationRequest::text(prompt).with_search(true))
            .await;

        let expected: String = prompt.chars().take(100).collect();
        let query = seen.lock().unwrap().clone().unwrap();
        assert_eq!(query.chars().count(), 100);
        assert_eq!(query, expected);

        let sent = h.local_prompt.lock().unwrap().clone().unwrap();
        assert!(sent.ends_with(&format!("User Question:\n{}", prompt)));
    }

    #[tokio::test]
    async fn test_status_line() {
        let h = harness(
            PolicyMode::Auto,
            FakeProvider::new("Local (gemma3:4b)", false, Ok("")),
            FakeProvider::new("Cloud (gemma-3-27b-it)", true, Ok("")),
            SearchAugmenter::disabled(),
        );
        assert_eq!(h.dispatcher.status().await, "Connected: Cloud (gemma-3-27b-it)");

        let h = harness(
            PolicyMode::Auto,
            FakeProvider::new("Local", false, Ok("")),
            FakeProvider::new("Cloud", false, Ok("")),
            SearchAugmenter::disabled(),
        );
        assert_eq!(
            h.dispatcher.status().await,
            "No AI Connected (Start Ollama or set API Key)"
        );
    }
}
