//! Shared types, error model, and configuration for Ghostwriter.
//!
//! This crate is the foundation depended on by all other Ghostwriter crates.
//! It provides:
//! - [`GhostwriterError`] — the unified error type
//! - Domain types ([`ChatMessage`], [`ChatRole`], [`Tone`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AgentConfig, AppConfig, AzureConfig, GhostConfig, ResearchConfig, SandboxConfig, StateConfig,
    config_dir, config_file_path, env_value, init_config, load_config, load_config_from,
    load_dotenv, load_dotenv_from, validate_api_key,
};
pub use error::{GhostwriterError, Result};
pub use types::{ChatMessage, ChatRole, Tone, deserialize_timestamp, parse_timestamp};
