//! Application configuration for Ghostwriter.
//!
//! User config lives at `~/.ghostwriter/ghostwriter.toml`.
//! Secrets never live in the file: each section names the environment
//! variable holding its key. Endpoint env vars override file values.
//! A `.env` file in the working directory (or a parent) is loaded into the
//! process environment first; variables already set keep their value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GhostwriterError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ghostwriter.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ghostwriter";

// ---------------------------------------------------------------------------
// Config structs (matching ghostwriter.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Azure OpenAI chat settings.
    #[serde(default)]
    pub azure: AzureConfig,

    /// Ghost Admin API settings.
    #[serde(default)]
    pub ghost: GhostConfig,

    /// SERP / Tavily research settings.
    #[serde(default)]
    pub research: ResearchConfig,

    /// Judge0 code-execution settings.
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Session state file.
    #[serde(default)]
    pub state: StateConfig,
}

/// `[azure]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    #[serde(default)]
    pub endpoint: String,

    /// Env var that overrides `endpoint` when set.
    #[serde(default = "default_azure_endpoint_env")]
    pub endpoint_env: String,

    /// Model deployment name.
    #[serde(default = "default_deployment")]
    pub deployment: String,

    /// REST API version query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_azure_key_env")]
    pub api_key_env: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            endpoint_env: default_azure_endpoint_env(),
            deployment: default_deployment(),
            api_version: default_api_version(),
            api_key_env: default_azure_key_env(),
        }
    }
}

fn default_azure_endpoint_env() -> String {
    "AZURE_OPENAI_ENDPOINT".into()
}
fn default_deployment() -> String {
    "gpt-4o-2".into()
}
fn default_api_version() -> String {
    "2024-08-01-preview".into()
}
fn default_azure_key_env() -> String {
    "AZURE_OPENAI_API_KEY".into()
}

impl AzureConfig {
    /// Resolve the endpoint: env override first, then the file value.
    pub fn resolve_endpoint(&self) -> Result<String> {
        resolve_with_env(&self.endpoint_env, &self.endpoint).ok_or_else(|| {
            GhostwriterError::config(format!(
                "Azure OpenAI endpoint not configured. Set {} or [azure].endpoint",
                self.endpoint_env
            ))
        })
    }
}

/// `[ghost]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostConfig {
    /// Blog base URL, e.g. `https://blog.example.com`.
    #[serde(default)]
    pub api_url: String,

    /// Env var that overrides `api_url` when set.
    #[serde(default = "default_ghost_url_env")]
    pub api_url_env: String,

    /// Name of the env var holding the `<id>:<secret>` Admin API key.
    #[serde(default = "default_ghost_key_env")]
    pub api_key_env: String,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_url_env: default_ghost_url_env(),
            api_key_env: default_ghost_key_env(),
        }
    }
}

fn default_ghost_url_env() -> String {
    "GHOST_API_URL".into()
}
fn default_ghost_key_env() -> String {
    "GHOST_API_KEY".into()
}

impl GhostConfig {
    /// Resolve the blog URL: env override first, then the file value.
    pub fn resolve_api_url(&self) -> Option<String> {
        resolve_with_env(&self.api_url_env, &self.api_url)
    }
}

/// `[research]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Name of the env var holding the SerpApi key.
    #[serde(default = "default_serpapi_key_env")]
    pub serpapi_key_env: String,

    /// Name of the env var holding the Tavily key.
    #[serde(default = "default_tavily_key_env")]
    pub tavily_key_env: String,

    /// Query used to discover trending topics.
    #[serde(default = "default_trending_query")]
    pub trending_query: String,

    /// Maximum results requested from each search API.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Domains Tavily should search.
    #[serde(default = "default_include_domains")]
    pub include_domains: Vec<String>,

    /// Domains Tavily should skip.
    #[serde(default = "default_exclude_domains")]
    pub exclude_domains: Vec<String>,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            serpapi_key_env: default_serpapi_key_env(),
            tavily_key_env: default_tavily_key_env(),
            trending_query: default_trending_query(),
            max_results: default_max_results(),
            include_domains: default_include_domains(),
            exclude_domains: default_exclude_domains(),
        }
    }
}

fn default_serpapi_key_env() -> String {
    "SERPAPI_KEY".into()
}
fn default_tavily_key_env() -> String {
    "TAVILY_API_KEY".into()
}
fn default_trending_query() -> String {
    "latest artificial intelligence security trends".into()
}
fn default_max_results() -> u32 {
    5
}
fn default_include_domains() -> Vec<String> {
    ["arxiv.org", "github.com", "microsoft.com", "google.com", "openai.com"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_exclude_domains() -> Vec<String> {
    ["youtube.com", "facebook.com", "twitter.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// `[sandbox]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Judge0 base URL.
    #[serde(default = "default_judge0_url")]
    pub api_url: String,

    /// Value for the `X-RapidAPI-Host` header.
    #[serde(default = "default_judge0_host")]
    pub api_host: String,

    /// Name of the env var holding the RapidAPI key.
    #[serde(default = "default_judge0_key_env")]
    pub api_key_env: String,

    /// Delay between submission status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before giving up.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            api_url: default_judge0_url(),
            api_host: default_judge0_host(),
            api_key_env: default_judge0_key_env(),
            poll_interval_ms: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

fn default_judge0_url() -> String {
    "https://judge0-ce.p.rapidapi.com".into()
}
fn default_judge0_host() -> String {
    "judge0-ce.p.rapidapi.com".into()
}
fn default_judge0_key_env() -> String {
    "JUDGE0_API_KEY".into()
}
fn default_poll_interval() -> u64 {
    500
}
fn default_max_polls() -> u32 {
    60
}

/// `[agent]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model round-trips spent on tool calls per request.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

fn default_max_tool_rounds() -> u32 {
    8
}

/// `[state]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path of the chat-history state file (relative to the working dir).
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> String {
    ".cli_state.json".into()
}

// ---------------------------------------------------------------------------
// Env helpers
// ---------------------------------------------------------------------------

/// Load `KEY=value` pairs from the nearest `.env` file. Returns the file
/// that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded .env file");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read .env file");
            None
        }
    }
}

/// Load `KEY=value` pairs from a specific env file.
pub fn load_dotenv_from(path: &Path) -> Result<()> {
    dotenvy::from_path(path)
        .map_err(|e| GhostwriterError::config(format!("failed to load {}: {e}", path.display())))
}

/// Read a non-empty env var.
pub fn env_value(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

fn resolve_with_env(var_name: &str, fallback: &str) -> Option<String> {
    env_value(var_name).or_else(|| {
        let fallback = fallback.trim();
        (!fallback.is_empty()).then(|| fallback.to_string())
    })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ghostwriter/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GhostwriterError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ghostwriter/ghostwriter.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GhostwriterError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        GhostwriterError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GhostwriterError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GhostwriterError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GhostwriterError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the Azure OpenAI API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.azure.api_key_env;
    env_value(var_name).ok_or_else(|| {
        GhostwriterError::config(format!(
            "Azure OpenAI API key not found. Set the {var_name} environment variable."
        ))
    })
}
