//! A persisted conversation with the agent.

use tracing::{info, instrument};

use ghostwriter_shared::{AppConfig, ChatRole, Result};
use ghostwriter_storage::StateStore;

use crate::agent::{Agent, AgentProgress};
use crate::topics::extract_topics;

/// Phrase in a user message that marks the reply as a topic list.
const TOPICS_TRIGGER: &str = "trending topics";

pub struct Session {
    agent: Agent,
    store: StateStore,
}

impl Session {
    pub fn new(agent: Agent, store: StateStore) -> Self {
        Self { agent, store }
    }

    /// Open the configured state file and build the agent.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = StateStore::open(&config.state.path)?;
        Ok(Self::new(Agent::from_config(config)?, store))
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Send `message` to the agent and persist both sides of the exchange.
    ///
    /// The user message is saved before the agent runs, so it survives a
    /// failed turn.
    #[instrument(skip_all)]
    pub async fn ask(&mut self, message: &str, progress: &dyn AgentProgress) -> Result<String> {
        let history = self.store.chat_history().to_vec();
        self.store.add_message(ChatRole::User, message)?;

        let reply = self.agent.run(&history, message, progress).await?;
        self.store.add_message(ChatRole::Assistant, reply.as_str())?;

        if message.to_lowercase().contains(TOPICS_TRIGGER) {
            let topics = extract_topics(&reply);
            if !topics.is_empty() {
                info!(count = topics.len(), "stored trending topics");
                self.store.set_topics(topics)?;
            }
        }

        Ok(reply)
    }
}
