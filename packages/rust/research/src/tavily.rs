//! Tavily research client.

use ghostwriter_shared::{GhostwriterError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{build_client, check_status};

/// Public Tavily endpoint.
pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    max_results: u32,
    #[serde(skip_serializing_if = "no_domains")]
    include_domains: &'a [String],
    #[serde(skip_serializing_if = "no_domains")]
    exclude_domains: &'a [String],
}

fn no_domains(domains: &&[String]) -> bool {
    domains.is_empty()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// One source returned by a Tavily search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// ResearchReport
// ---------------------------------------------------------------------------

/// Outcome of researching one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub topic: String,
    /// Tavily's synthesized answer, when it produced one.
    pub answer: Option<String>,
    pub results: Vec<SearchHit>,
}

impl ResearchReport {
    /// Text handed to the model: the answer, or a bulleted source digest.
    pub fn to_text(&self) -> String {
        if let Some(answer) = self.answer.as_deref().filter(|a| !a.trim().is_empty()) {
            return answer.to_string();
        }

        let mut text = String::from("Research Findings:\n\n");
        for hit in &self.results {
            let title = hit.title.as_deref().unwrap_or("Untitled");
            let content = hit.content.as_deref().unwrap_or("No content available");
            text.push_str(&format!("- {title}\n  {content}\n\n"));
        }
        text
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Search tuning sent with every request.
#[derive(Debug, Clone)]
pub struct TavilyOptions {
    pub max_results: u32,
    pub include_domains: Vec<String>,
    pub exclude_domains: Vec<String>,
}

impl Default for TavilyOptions {
    fn default() -> Self {
        Self {
            max_results: 5,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }
}

/// Client for Tavily's search endpoint.
pub struct TavilyClient {
    client: Client,
    base_url: String,
    api_key: String,
    options: TavilyOptions,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, options: TavilyOptions) -> Result<Self> {
        Self::with_base_url(TAVILY_BASE_URL, api_key, options)
    }

    /// Point the client at another host (mock servers, proxies).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: TavilyOptions,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            options,
        })
    }

    /// Run an advanced search on `topic`.
    #[instrument(skip(self))]
    pub async fn research(&self, topic: &str) -> Result<ResearchReport> {
        let url = format!("{}/search", self.base_url);
        let request = SearchRequest {
            api_key: &self.api_key,
            query: topic,
            search_depth: "advanced",
            include_answer: true,
            include_raw_content: false,
            max_results: self.options.max_results,
            include_domains: &self.options.include_domains,
            exclude_domains: &self.options.exclude_domains,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GhostwriterError::Network(format!("tavily: {e}")))?;

        let response = check_status("tavily", response).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GhostwriterError::parse(format!("tavily response: {e}")))?;

        info!(
            has_answer = body.answer.is_some(),
            sources = body.results.len(),
            "tavily research completed"
        );

        Ok(ResearchReport {
            topic: topic.to_string(),
            answer: body.answer,
            results: body.results,
        })
    }
}
