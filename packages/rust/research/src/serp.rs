//! SerpApi Google search client.

use ghostwriter_shared::{GhostwriterError, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{build_client, check_status};

/// Public SerpApi endpoint.
pub const SERPAPI_BASE_URL: &str = "https://serpapi.com";

/// Restrict results to the past week.
const RECENCY_FILTER: &str = "qdr:w";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
}

/// Client for SerpApi's Google engine.
pub struct SerpClient {
    client: Client,
    base_url: String,
    api_key: String,
    num_results: u32,
}

impl SerpClient {
    pub fn new(api_key: impl Into<String>, num_results: u32) -> Result<Self> {
        Self::with_base_url(SERPAPI_BASE_URL, api_key, num_results)
    }

    /// Point the client at another host (mock servers, proxies).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        num_results: u32,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            num_results,
        })
    }

    /// Titles of this week's top organic results for `query`.
    #[instrument(skip(self))]
    pub async fn trending_topics(&self, query: &str) -> Result<Vec<String>> {
        let url = format!("{}/search.json", self.base_url);
        let num = self.num_results.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
                ("tbs", RECENCY_FILTER),
            ])
            .send()
            .await
            .map_err(|e| GhostwriterError::Network(format!("serpapi: {e}")))?;

        let status = response.status().as_u16();
        let response = check_status("serpapi", response).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GhostwriterError::parse(format!("serpapi response: {e}")))?;

        if let Some(error) = body.error {
            return Err(GhostwriterError::Api {
                service: "serpapi",
                status,
                body: error,
            });
        }

        let titles: Vec<String> = body.organic_results.into_iter().map(|r| r.title).collect();
        info!(count = titles.len(), "trending topics fetched");
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_organic_titles() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("engine", "google"))
            .and(query_param("q", "ai security"))
            .and(query_param("api_key", "serp-key"))
            .and(query_param("num", "5"))
            .and(query_param("tbs", "qdr:w"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic_results": [
                    { "title": "Prompt injection in the wild", "link": "https://a" },
                    { "title": "Securing model supply chains", "link": "https://b" }
                ]
            })))
            .mount(&server)
            .await;

        let client = SerpClient::with_base_url(server.uri(), "serp-key", 5).unwrap();
        let topics = client.trending_topics("ai security").await.unwrap();
        assert_eq!(
            topics,
            vec![
                "Prompt injection in the wild".to_string(),
                "Securing model supply chains".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn missing_results_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = SerpClient::with_base_url(server.uri(), "k", 5).unwrap();
        assert!(client.trending_topics("q").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_field_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "error": "Invalid API key." })),
            )
            .mount(&server)
            .await;

        let client = SerpClient::with_base_url(server.uri(), "bad", 5).unwrap();
        let err = client.trending_topics("q").await.unwrap_err();
        assert!(err.to_string().contains("Invalid API key."));
    }

    #[tokio::test]
    async fn http_failure_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = SerpClient::with_base_url(server.uri(), "k", 5).unwrap();
        match client.trending_topics("q").await {
            Err(GhostwriterError::Api { service, status, body }) => {
                assert_eq!(service, "serpapi");
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
