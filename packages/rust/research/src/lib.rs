//! Search-API clients used to pick and research blog topics.
//!
//! [`SerpClient`] asks Google (through SerpApi) what is trending for a
//! query; [`TavilyClient`] runs an in-depth search on a single topic and
//! returns a synthesized answer plus sources.

mod serp;
mod tavily;

use std::time::Duration;

use ghostwriter_shared::{GhostwriterError, Result};
use reqwest::Client;

pub use serp::{SERPAPI_BASE_URL, SerpClient};
pub use tavily::{ResearchReport, SearchHit, TAVILY_BASE_URL, TavilyClient, TavilyOptions};

/// Default timeout in seconds for search requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for research requests.
const USER_AGENT: &str = concat!("Ghostwriter/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with appropriate settings.
fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| GhostwriterError::Network(format!("failed to build HTTP client: {e}")))
}

/// Turn a non-success response into [`GhostwriterError::Api`].
async fn check_status(service: &'static str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GhostwriterError::Api {
        service,
        status: status.as_u16(),
        body,
    })
}
