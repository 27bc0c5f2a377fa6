//! Chat agent: the model plus the toolbox, driven until it stops calling
//! tools.

use tracing::{debug, info, instrument};

use ghostwriter_shared::{AppConfig, ChatMessage, ChatRole, GhostwriterError, Result};

use crate::llm::{AzureChatClient, WireMessage};
use crate::prompts::AGENT_INSTRUCTIONS;
use crate::tools::Toolbox;

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callbacks for a running turn.
pub trait AgentProgress: Send + Sync {
    /// Called before each model request.
    fn thinking(&self, round: u32);
    /// Called before a tool runs.
    fn tool_started(&self, name: &str);
    /// Called after a tool returns.
    fn tool_finished(&self, name: &str);
}

/// No-op progress for headless/test usage.
pub struct SilentAgentProgress;

impl AgentProgress for SilentAgentProgress {
    fn thinking(&self, _round: u32) {}
    fn tool_started(&self, _name: &str) {}
    fn tool_finished(&self, _name: &str) {}
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

pub struct Agent {
    client: AzureChatClient,
    toolbox: Toolbox,
    instructions: String,
    max_tool_rounds: u32,
}

impl Agent {
    pub fn new(client: AzureChatClient, toolbox: Toolbox, max_tool_rounds: u32) -> Self {
        Self {
            client,
            toolbox,
            instructions: AGENT_INSTRUCTIONS.to_string(),
            max_tool_rounds,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            AzureChatClient::from_config(config)?,
            Toolbox::from_config(config)?,
            config.agent.max_tool_rounds,
        ))
    }

    /// Replace the system instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Answer `input` given the prior conversation.
    ///
    /// Tool calls are executed in the order the model lists them and their
    /// results fed back until the model replies with plain text. More than
    /// `max_tool_rounds` rounds of tool calls is an error.
    #[instrument(skip_all, fields(history = history.len()))]
    pub async fn run(
        &self,
        history: &[ChatMessage],
        input: &str,
        progress: &dyn AgentProgress,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage::System {
            content: self.instructions.clone(),
        });
        messages.extend(history.iter().map(to_wire));
        messages.push(WireMessage::User {
            content: input.to_string(),
        });

        let tools = self.toolbox.definitions();
        let mut round = 0;

        loop {
            progress.thinking(round);
            let reply = self.client.complete(&messages, &tools).await?;

            if reply.tool_calls.is_empty() {
                info!(rounds = round, "agent replied");
                return Ok(reply.content.unwrap_or_default());
            }

            if round >= self.max_tool_rounds {
                return Err(GhostwriterError::Llm(format!(
                    "model still calling tools after {} rounds",
                    self.max_tool_rounds
                )));
            }
            round += 1;

            let calls = reply.tool_calls.clone();
            messages.push(WireMessage::Assistant {
                content: reply.content,
                tool_calls: reply.tool_calls,
            });

            for call in calls {
                debug!(tool = %call.function.name, id = %call.id, "tool call");
                progress.tool_started(&call.function.name);
                let output = self
                    .toolbox
                    .invoke(&call.function.name, &call.function.arguments)
                    .await;
                progress.tool_finished(&call.function.name);
                messages.push(WireMessage::Tool {
                    tool_call_id: call.id,
                    content: output,
                });
            }
        }
    }
}

fn to_wire(message: &ChatMessage) -> WireMessage {
    match message.role {
        ChatRole::User => WireMessage::User {
            content: message.content.clone(),
        },
        ChatRole::Assistant => WireMessage::Assistant {
            content: Some(message.content.clone()),
            tool_calls: Vec::new(),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::content::ContentTools;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn text_reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    pub(crate) fn tool_reply(id: &str, name: &str, arguments: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": id,
                        "type": "function",
                        "function": { "name": name, "arguments": arguments }
                    }]
                }
            }]
        }))
    }

    pub(crate) fn offline_agent(server: &MockServer, max_tool_rounds: u32) -> Agent {
        let client = AzureChatClient::new(&server.uri(), "gpt-4o-2", "v", "k").unwrap();
        let toolbox = Toolbox::new(ContentTools::offline(), None, None);
        Agent::new(client, toolbox, max_tool_rounds)
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl AgentProgress for RecordingProgress {
        fn thinking(&self, round: u32) {
            self.events.lock().unwrap().push(format!("thinking {round}"));
        }
        fn tool_started(&self, name: &str) {
            self.events.lock().unwrap().push(format!("start {name}"));
        }
        fn tool_finished(&self, name: &str) {
            self.events.lock().unwrap().push(format!("finish {name}"));
        }
    }

    #[tokio::test]
    async fn plain_reply_returns_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_reply("Hi!"))
            .expect(1)
            .mount(&server)
            .await;

        let agent = offline_agent(&server, 4);
        let history = vec![
            ChatMessage::new(ChatRole::User, "earlier"),
            ChatMessage::new(ChatRole::Assistant, "reply"),
        ];
        let out = agent.run(&history, "hello", &SilentAgentProgress).await.unwrap();
        assert_eq!(out, "Hi!");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let roles: Vec<_> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(body["messages"][3]["content"], "hello");
    }

    #[tokio::test]
    async fn tool_results_are_fed_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(tool_reply(
                "call_1",
                "content-research_topic",
                r#"{"topic":"Zero Trust"}"#,
            ))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(text_reply("Zero Trust is about verifying everything."))
            .mount(&server)
            .await;

        let agent = offline_agent(&server, 4);
        let progress = RecordingProgress::default();
        let out = agent.run(&[], "Research the topic: Zero Trust", &progress).await.unwrap();
        assert_eq!(out, "Zero Trust is about verifying everything.");

        assert_eq!(
            *progress.events.lock().unwrap(),
            [
                "thinking 0",
                "start content-research_topic",
                "finish content-research_topic",
                "thinking 1"
            ]
        );

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        let assistant = &messages[2];
        assert_eq!(assistant["role"], "assistant");
        assert_eq!(assistant["tool_calls"][0]["id"], "call_1");
        let tool = &messages[3];
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call_1");
        assert!(
            tool["content"]
                .as_str()
                .unwrap()
                .starts_with("Here's what we know about Zero Trust:")
        );
    }

    #[tokio::test]
    async fn tool_errors_reach_the_model_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(tool_reply("call_x", "content-missing", "{}"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(text_reply("Sorry, that failed."))
            .mount(&server)
            .await;

        let agent = offline_agent(&server, 4);
        let out = agent.run(&[], "do it", &SilentAgentProgress).await.unwrap();
        assert_eq!(out, "Sorry, that failed.");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        let tool_output = body["messages"][3]["content"].as_str().unwrap();
        assert!(tool_output.contains("unknown tool"));
    }

    #[tokio::test]
    async fn endless_tool_calls_hit_round_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(tool_reply("c", "content-get_trending_topics", "{}"))
            .expect(3)
            .mount(&server)
            .await;

        let agent = offline_agent(&server, 2);
        let err = agent.run(&[], "loop", &SilentAgentProgress).await.unwrap_err();
        assert!(matches!(err, GhostwriterError::Llm(_)));
    }

    #[tokio::test]
    async fn custom_instructions_replace_system_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_reply("ok"))
            .mount(&server)
            .await;

        let agent = offline_agent(&server, 1).with_instructions("Be brief.");
        agent.run(&[], "hi", &SilentAgentProgress).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["messages"][0]["content"], "Be brief.");
    }
}
