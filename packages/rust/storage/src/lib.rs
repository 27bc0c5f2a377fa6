//! Flat-file session state: chat history and the last discovered topics.
//!
//! The whole state is one pretty-printed JSON document. Every mutation
//! rewrites the file in full; there is no journaling or locking.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ghostwriter_shared::{ChatMessage, ChatRole, GhostwriterError, Result, deserialize_timestamp};

/// On-disk layout of the state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            chat_history: Vec::new(),
            topics: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

/// Handle to the state file plus its in-memory copy.
pub struct StateStore {
    path: PathBuf,
    state: SessionState,
}

impl StateStore {
    /// Load state from `path`. A missing or unreadable-as-JSON file yields
    /// fresh default state; the file is only written on the first mutation.
    ///
    /// Valid JSON that does not match [`SessionState`] is an error, so the
    /// file is never overwritten with an empty history.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = load_state(&path)?;
        Ok(Self { path, state })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a message and persist.
    pub fn add_message(&mut self, role: ChatRole, content: impl Into<String>) -> Result<()> {
        self.state.chat_history.push(ChatMessage::new(role, content));
        self.save()
    }

    /// Replace the stored topics and persist.
    pub fn set_topics(&mut self, topics: Vec<String>) -> Result<()> {
        self.state.topics = topics;
        self.state.last_updated = Utc::now();
        self.save()
    }

    /// Drop all chat messages and persist. Topics are kept.
    pub fn clear_history(&mut self) -> Result<()> {
        self.state.chat_history.clear();
        self.save()
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.state.chat_history
    }

    pub fn topics(&self) -> &[String] {
        &self.state.topics
    }

    /// When topics were last replaced.
    pub fn last_topics_update(&self) -> DateTime<Utc> {
        self.state.last_updated
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| GhostwriterError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| GhostwriterError::Storage(format!("failed to encode state: {e}")))?;
        std::fs::write(&self.path, json).map_err(|e| GhostwriterError::io(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            messages = self.state.chat_history.len(),
            topics = self.state.topics.len(),
            "state saved"
        );
        Ok(())
    }
}

fn load_state(path: &Path) -> Result<SessionState> {
    if !path.exists() {
        debug!(path = %path.display(), "state file not found, starting fresh");
        return Ok(SessionState::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| GhostwriterError::io(path, e))?;
    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "state file is not valid JSON, starting fresh"
            );
            return Ok(SessionState::default());
        }
    };

    serde_json::from_value(value).map_err(|e| {
        GhostwriterError::Storage(format!(
            "state file {} has an unexpected layout: {e}",
            path.display()
        ))
    })
}
