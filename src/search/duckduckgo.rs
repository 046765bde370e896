//! DuckDuckGo HTML endpoint scraper
use super::{SearchBackend, SearchResult};
use crate::config::SearchConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scrapes result cards from `html.duckduckgo.com`
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    whitespace: Regex,
}

impl DuckDuckGoSearch {
    pub fn new(endpoint: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.timeout_seconds)
    }

    /// Extract organic results from a results page, skipping ads
    pub fn parse_results(&self, html: &str, max_results: usize) -> Vec<SearchResult> {
        let document = Html::parse_document(html);
        let (Ok(card_selector), Ok(link_selector), Ok(snippet_selector)) = (
            Selector::parse("div.result"),
            Selector::parse("a.result__a"),
            Selector::parse(".result__snippet"),
        ) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        for card in document.select(&card_selector) {
            if results.len() >= max_results {
                break;
            }

            if card.value().classes().any(|c| c == "result--ad") {
                continue;
            }

            let Some(link) = card.select(&link_selector).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };

            let title = self.clean_text(&link);
            if title.is_empty() {
                continue;
            }

            let summary = card
                .select(&snippet_selector)
                .next()
                .map(|s| self.clean_text(&s))
                .unwrap_or_default();

            results.push(SearchResult {
                title,
                url: resolve_link(href),
                summary,
            });
        }

        results
    }

    fn clean_text(&self, element: &ElementRef) -> String {
        let text = element.text().collect::<String>();
        self.whitespace.replace_all(text.trim(), " ").to_string()
    }
}

/// Unwrap `//duckduckgo.com/l/?uddg=<target>` redirect links
pub fn resolve_link(href: &str) -> String {
    let parsed = if href.starts_with("//") {
        Url::parse(&format!("https:{}", href))
    } else {
        Url::parse(href).or_else(|_| Url::parse("https://duckduckgo.com").and_then(|base| base.join(href)))
    };

    let Ok(url) = parsed else {
        return href.to_string();
    };

    url.query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, target)| target.into_owned())
        .unwrap_or_else(|| url.to_string())
}

#[async_trait]
impl SearchBackend for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        info!("🔎 Searching the web: {}", query);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Search HTTP error {}", response.status()));
        }

        let html = response.text().await?;
        debug!("📄 Downloaded {} characters of search results", html.len());

        Ok(self.parse_results(&html, max_results))
    }
}
