//! Azure OpenAI chat-completions client with function calling.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use ghostwriter_shared::{AppConfig, GhostwriterError, Result, validate_api_key};

/// Chat completions can take a while on long blog posts.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

/// One message of a chat-completions conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum WireMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

/// Function name plus JSON-encoded arguments, exactly as the model sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// The model's answer for one round.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssistantReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for one Azure OpenAI deployment.
pub struct AzureChatClient {
    client: Client,
    completions_url: String,
    api_key: String,
}

impl AzureChatClient {
    pub fn new(endpoint: &str, deployment: &str, api_version: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GhostwriterError::Network(format!("failed to build HTTP client: {e}")))?;

        let completions_url = format!(
            "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
            endpoint.trim_end_matches('/')
        );

        Ok(Self {
            client,
            completions_url,
            api_key: api_key.to_string(),
        })
    }

    /// Build from the `[azure]` config section and the key env var.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = validate_api_key(config)?;
        let endpoint = config.azure.resolve_endpoint()?;
        Self::new(
            &endpoint,
            &config.azure.deployment,
            &config.azure.api_version,
            &api_key,
        )
    }

    /// Request one completion. Tools, when given, are offered with
    /// `tool_choice: "auto"`.
    #[instrument(skip_all, fields(messages = messages.len(), tools = tools.len()))]
    pub async fn complete(
        &self,
        messages: &[WireMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantReply> {
        let request = ChatRequest {
            messages,
            tools: tools
                .iter()
                .map(|t| ToolSpec {
                    kind: "function",
                    function: FunctionSpec {
                        name: t.name,
                        description: t.description,
                        parameters: &t.parameters,
                    },
                })
                .collect(),
            tool_choice: (!tools.is_empty()).then_some("auto"),
        };

        let response = self
            .client
            .post(&self.completions_url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GhostwriterError::Network(format!("azure openai: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GhostwriterError::Api {
                service: "azure-openai",
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GhostwriterError::parse(format!("azure openai response: {e}")))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GhostwriterError::Llm("completion returned no choices".into()))?;

        let reply = AssistantReply {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        };

        debug!(
            content_len = reply.content.as_deref().map_or(0, str::len),
            tool_calls = reply.tool_calls.len(),
            "completion received"
        );

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn wire_messages_serialize_with_role_tag() {
        let msg = WireMessage::Tool {
            tool_call_id: "call_1".into(),
            content: "done".into(),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"role":"tool","tool_call_id":"call_1","content":"done"}"#
        );

        let msg = WireMessage::Assistant {
            content: Some("hi".into()),
            tool_calls: vec![],
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"role":"assistant","content":"hi"}"#
        );
    }

    #[test]
    fn assistant_tool_call_round_trips() {
        let json = r#"{"role":"assistant","content":null,"tool_calls":[{"id":"call_9","type":"function","function":{"name":"content-research_topic","arguments":"{\"topic\":\"AI\"}"}}]}"#;
        let msg: WireMessage = serde_json::from_str(json).unwrap();
        match &msg {
            WireMessage::Assistant { content, tool_calls } => {
                assert!(content.is_none());
                assert_eq!(tool_calls[0].function.name, "content-research_topic");
            }
            other => panic!("expected assistant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_posts_to_deployment() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o-2/chat/completions"))
            .and(query_param("api-version", "2024-08-01-preview"))
            .and(header("api-key", "az-key"))
            .and(body_partial_json(serde_json::json!({
                "tool_choice": "auto",
                "tools": [{ "type": "function", "function": { "name": "echo" } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "Hello there" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AzureChatClient::new(
            &format!("{}/", server.uri()),
            "gpt-4o-2",
            "2024-08-01-preview",
            "az-key",
        )
        .unwrap();

        let tools = [ToolDefinition {
            name: "echo",
            description: "Echo input",
            parameters: serde_json::json!({ "type": "object", "properties": {} }),
        }];
        let messages = [WireMessage::User {
            content: "hi".into(),
        }];

        let reply = client.complete(&messages, &tools).await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("Hello there"));
        assert!(reply.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn no_tools_omits_tool_choice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "ok" } }]
            })))
            .mount(&server)
            .await;

        let client = AzureChatClient::new(&server.uri(), "d", "v", "k").unwrap();
        client.complete(&[], &[]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[tokio::test]
    async fn empty_choices_is_llm_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client = AzureChatClient::new(&server.uri(), "d", "v", "k").unwrap();
        let err = client.complete(&[], &[]).await.unwrap_err();
        assert!(matches!(err, GhostwriterError::Llm(_)));
    }

    #[tokio::test]
    async fn http_error_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = AzureChatClient::new(&server.uri(), "d", "v", "k").unwrap();
        let err = client.complete(&[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}
