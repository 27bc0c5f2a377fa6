//! Judge0 code-execution client.
//!
//! Source is screened locally ([`validate_code`]) before it is submitted.
//! Submissions are then polled until Judge0 leaves the queued/processing
//! states or the poll budget runs out.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use ghostwriter_shared::{GhostwriterError, Result};

/// Judge0 language id for Python 3.
pub const PYTHON3_LANGUAGE_ID: u32 = 71;

/// Substrings that make a submission fail local screening.
const UNSAFE_OPERATIONS: &[&str] = &["os.", "subprocess.", "sys."];

const STATUS_IN_QUEUE: u32 = 1;
const STATUS_PROCESSING: u32 = 2;
const STATUS_ACCEPTED: u32 = 3;

/// Default timeout in seconds for a single Judge0 request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `true` when `code` contains none of the blocked operations.
pub fn validate_code(code: &str) -> bool {
    UNSAFE_OPERATIONS.iter().all(|op| !code.contains(op))
}

// ---------------------------------------------------------------------------
// Request / outcome types
// ---------------------------------------------------------------------------

/// A program to run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn python(source_code: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            language_id: PYTHON3_LANGUAGE_ID,
            stdin: String::new(),
        }
    }
}

/// Final state of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Blocked by local screening; nothing was sent.
    Rejected,
    /// Judge0 status 3.
    Accepted { stdout: Option<String> },
    /// Any other terminal status (compile error, runtime error, TLE, ...).
    Failed {
        description: String,
        stderr: Option<String>,
    },
}

impl ExecutionOutcome {
    /// Human-readable result handed back to the agent.
    pub fn to_message(&self) -> String {
        match self {
            Self::Rejected => "Code failed safety validation".to_string(),
            Self::Accepted { stdout } => match stdout.as_deref() {
                Some(out) if !out.is_empty() => out.to_string(),
                _ => "Code executed successfully (no output)".to_string(),
            },
            Self::Failed {
                description,
                stderr,
            } => format!(
                "Execution error: {description}\n{}",
                stderr.as_deref().unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmissionCreated {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionStatus {
    status: StatusInfo,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusInfo {
    id: u32,
    description: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connection and polling settings.
#[derive(Debug, Clone)]
pub struct Judge0Options {
    pub api_url: String,
    pub api_host: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

/// Client for a Judge0 (RapidAPI-hosted) instance.
pub struct Judge0Client {
    client: Client,
    api_key: String,
    options: Judge0Options,
}

impl Judge0Client {
    pub fn new(api_key: impl Into<String>, mut options: Judge0Options) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GhostwriterError::Network(format!("failed to build HTTP client: {e}")))?;

        options.api_url = options.api_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            api_key: api_key.into(),
            options,
        })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.options.api_host)
    }

    /// Screen, submit, and wait for `request` to finish.
    #[instrument(skip_all, fields(language_id = request.language_id))]
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome> {
        if !validate_code(&request.source_code) {
            warn!("submission blocked by safety screening");
            return Ok(ExecutionOutcome::Rejected);
        }

        let token = self.submit(request).await?;
        debug!(%token, "submission created");

        for attempt in 1..=self.options.max_polls {
            let status = self.poll(&token).await?;
            match status.status.id {
                STATUS_IN_QUEUE | STATUS_PROCESSING => {
                    debug!(attempt, state = %status.status.description, "submission pending");
                    tokio::time::sleep(self.options.poll_interval).await;
                }
                STATUS_ACCEPTED => {
                    info!(attempt, "submission accepted");
                    return Ok(ExecutionOutcome::Accepted {
                        stdout: status.stdout,
                    });
                }
                _ => {
                    info!(attempt, state = %status.status.description, "submission failed");
                    return Ok(ExecutionOutcome::Failed {
                        description: status.status.description,
                        stderr: status.stderr,
                    });
                }
            }
        }

        Err(GhostwriterError::Timeout(format!(
            "Judge0 submission {token} still pending after {} polls",
            self.options.max_polls
        )))
    }

    async fn submit(&self, request: &ExecutionRequest) -> Result<String> {
        let url = format!("{}/submissions", self.options.api_url);
        let response = self
            .authed(self.client.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| GhostwriterError::Network(format!("judge0: {e}")))?;

        let created: SubmissionCreated = read_json(response).await?;
        Ok(created.token)
    }

    async fn poll(&self, token: &str) -> Result<SubmissionStatus> {
        let url = format!("{}/submissions/{token}", self.options.api_url);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| GhostwriterError::Network(format!("judge0: {e}")))?;

        read_json(response).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GhostwriterError::Api {
            service: "judge0",
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| GhostwriterError::parse(format!("judge0 response: {e}")))
}
