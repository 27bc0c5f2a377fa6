//! Agent orchestration for Ghostwriter.
//!
//! This crate ties the chat model, the blogging tools (research, drafting,
//! Ghost publishing, code execution) and persisted session state into the
//! conversational workflow the CLI drives.

pub mod agent;
pub mod content;
pub mod llm;
pub mod prompts;
pub mod session;
pub mod tools;
pub mod topics;

pub use agent::{Agent, AgentProgress, SilentAgentProgress};
pub use session::Session;
