//! Web search used to ground generated answers in fresh context

pub mod duckduckgo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;

pub use duckduckgo::DuckDuckGoSearch;

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub summary: String,
}

/// A web search engine
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchResult>>;
}

/// Render results as the context block prepended to augmented prompts
pub fn render_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("- Title: {}\n  URL: {}\n  Summary: {}\n\n", r.title, r.url, r.summary))
        .collect()
}

/// Optional search backend plus the number of results to fold in
pub struct SearchAugmenter {
    backend: Option<Box<dyn SearchBackend>>,
    max_results: usize,
}

impl SearchAugmenter {
    pub fn new(backend: Box<dyn SearchBackend>, max_results: usize) -> Self {
        Self {
            backend: Some(backend),
            max_results,
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            max_results: 0,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        if !config.ai.search_enabled {
            return Ok(Self::disabled());
        }

        let backend = DuckDuckGoSearch::from_config(&config.search)?;
        Ok(Self::new(Box::new(backend), config.ai.search_max_results))
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Search once and render up to `max_results` hits.
    /// Returns an empty string when disabled or when the search fails.
    pub async fn fetch_context(&self, query: &str, max_results: usize) -> String {
        let Some(backend) = &self.backend else {
            return String::new();
        };

        match backend.search(query, max_results).await {
            Ok(results) => {
                debug!("🔎 {} search result(s) for '{}'", results.len(), query);
                let kept: Vec<SearchResult> = results.into_iter().take(max_results).collect();
                render_context(&kept)
            }
            Err(e) => {
                warn!("Web search failed, continuing without context: {}", e);
                String::new()
            }
        }
    }
}
