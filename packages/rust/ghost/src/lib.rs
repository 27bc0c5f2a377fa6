//! Ghost Admin API client for publishing blog drafts.
//!
//! Drafts are sent as Lexical documents built by `ghostwriter-lexical`;
//! authentication uses the short-lived JWTs described in Ghost's Admin API
//! docs (see [`AdminApiKey`]).

mod auth;

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, error, info, instrument};
use url::Url;

use ghostwriter_lexical::LexicalInput;
use ghostwriter_shared::{GhostwriterError, Result};

pub use auth::{ADMIN_AUDIENCE, AdminApiKey, AdminClaims};

/// Path of the posts collection under the blog URL.
const POSTS_PATH: &str = "/ghost/api/admin/posts";

/// Default timeout in seconds for Admin API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for Admin API requests.
const USER_AGENT: &str = concat!("Ghostwriter/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreatePostsRequest<'a> {
    posts: [NewPost<'a>; 1],
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    title: &'a str,
    slug: String,
    lexical: String,
    status: &'a str,
    visibility: &'a str,
    created_at: String,
    updated_at: String,
}

// ---------------------------------------------------------------------------
// PublishOutcome
// ---------------------------------------------------------------------------

/// How Ghost answered a create-post request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// HTTP 201: the draft exists.
    Created { title: String },
    /// Any other status, with the raw response body.
    Rejected { status: u16, body: String },
}

impl PublishOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    /// Human-readable summary handed back to the agent.
    pub fn message(&self) -> String {
        match self {
            Self::Created { title } => format!("Successfully created the blog draft: {title}"),
            Self::Rejected { status, body } => format!(
                "Failed to create the blog draft. Status: {status}, Response: {body}"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Turn a title into a URL slug: lower-case, spaces to dashes.
pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

/// Client for one Ghost site.
pub struct GhostClient {
    client: Client,
    api_url: String,
    key: AdminApiKey,
}

impl GhostClient {
    /// `api_url` is the blog's base URL; `api_key` is the raw `<id>:<secret>` key.
    pub fn new(api_url: &str, api_key: &str) -> Result<Self> {
        Url::parse(api_url)
            .map_err(|e| GhostwriterError::config(format!("invalid Ghost URL '{api_url}': {e}")))?;
        let key = AdminApiKey::parse(api_key)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GhostwriterError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            key,
        })
    }

    fn posts_url(&self) -> String {
        format!("{}{POSTS_PATH}", self.api_url)
    }

    /// Convert `content` to Lexical and create a public draft post.
    #[instrument(skip(self, content), fields(url = %self.api_url))]
    pub async fn publish_draft(
        &self,
        title: &str,
        content: impl Into<LexicalInput>,
    ) -> Result<PublishOutcome> {
        let lexical = ghostwriter_lexical::build(content);
        let now = Utc::now();
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let request = CreatePostsRequest {
            posts: [NewPost {
                title,
                slug: slugify(title),
                lexical,
                status: "draft",
                visibility: "public",
                created_at: stamp.clone(),
                updated_at: stamp,
            }],
        };

        let token = self.key.token(now)?;
        let url = self.posts_url();
        debug!(%url, slug = %request.posts[0].slug, "sending draft to Ghost");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Ghost {token}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| GhostwriterError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GhostwriterError::Network(format!("{url}: failed to read body: {e}")))?;

        if status == StatusCode::CREATED {
            info!(title, "blog draft created");
            Ok(PublishOutcome::Created {
                title: title.to_string(),
            })
        } else {
            error!(title, status = status.as_u16(), "Ghost rejected the draft");
            Ok(PublishOutcome::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
