//! Functions the model can call, named `<plugin>-<function>`.
//!
//! Tool failures never abort a conversation: [`Toolbox::invoke`] turns every
//! error into text the model can read and react to.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use ghostwriter_ghost::GhostClient;
use ghostwriter_sandbox::{ExecutionRequest, Judge0Client, Judge0Options};
use ghostwriter_shared::{AppConfig, GhostwriterError, Result, Tone, env_value};

use crate::content::ContentTools;
use crate::llm::ToolDefinition;

pub const TRENDING_TOPICS: &str = "content-get_trending_topics";
pub const RESEARCH_TOPIC: &str = "content-research_topic";
pub const GENERATE_BLOG: &str = "content-generate_blog";
pub const GENERATE_BLOG_FROM_TOPIC: &str = "content-generate_blog_from_topic";
pub const POST_DRAFT: &str = "admin-post_draft";
pub const EXECUTE_PYTHON: &str = "code-execute_python_code";

/// Every tool the assistant knows about.
pub struct Toolbox {
    content: ContentTools,
    ghost: Option<GhostClient>,
    sandbox: Option<Judge0Client>,
}

impl Toolbox {
    pub fn new(
        content: ContentTools,
        ghost: Option<GhostClient>,
        sandbox: Option<Judge0Client>,
    ) -> Self {
        Self {
            content,
            ghost,
            sandbox,
        }
    }

    /// Wire up whichever services have credentials in the environment.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let content = ContentTools::from_config(&config.research)?;

        let ghost = match (
            config.ghost.resolve_api_url(),
            env_value(&config.ghost.api_key_env),
        ) {
            (Some(url), Some(key)) => Some(GhostClient::new(&url, &key)?),
            _ => {
                warn!(
                    url_env = %config.ghost.api_url_env,
                    key_env = %config.ghost.api_key_env,
                    "Ghost credentials not set, drafts cannot be published"
                );
                None
            }
        };

        let sandbox = match env_value(&config.sandbox.api_key_env) {
            Some(key) => Some(Judge0Client::new(
                key,
                Judge0Options {
                    api_url: config.sandbox.api_url.clone(),
                    api_host: config.sandbox.api_host.clone(),
                    poll_interval: Duration::from_millis(config.sandbox.poll_interval_ms),
                    max_polls: config.sandbox.max_polls,
                },
            )?),
            None => None,
        };

        Ok(Self::new(content, ghost, sandbox))
    }

    /// Tool schemas offered to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut tools = vec![
            ToolDefinition {
                name: TRENDING_TOPICS,
                description: "Get trending blog topics in AI and security",
                parameters: json!({ "type": "object", "properties": {} }),
            },
            ToolDefinition {
                name: RESEARCH_TOPIC,
                description: "Research a specific topic in depth",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "topic": { "type": "string", "description": "The topic to research" }
                    },
                    "required": ["topic"]
                }),
            },
            ToolDefinition {
                name: GENERATE_BLOG,
                description: "Generate a blog post from given content",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "description": "The title for the blog post" },
                        "content": { "type": "string", "description": "The research or content to base the blog on" }
                    },
                    "required": ["title", "content"]
                }),
            },
            ToolDefinition {
                name: GENERATE_BLOG_FROM_TOPIC,
                description: "Research a topic and generate a blog post about it",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "topic": { "type": "string", "description": "The topic to write about" },
                        "tone": {
                            "type": "string",
                            "enum": ["professional", "casual", "technical"],
                            "description": "The writing tone"
                        }
                    },
                    "required": ["topic"]
                }),
            },
            ToolDefinition {
                name: POST_DRAFT,
                description: "Post a blog draft to Ghost",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "description": "The blog post title" },
                        "content": { "type": "string", "description": "The blog post content in Markdown" }
                    },
                    "required": ["title", "content"]
                }),
            },
        ];

        if self.sandbox.is_some() {
            tools.push(ToolDefinition {
                name: EXECUTE_PYTHON,
                description: "Execute Python code in a sandbox and return its output",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "code": { "type": "string", "description": "The Python code to run" }
                    },
                    "required": ["code"]
                }),
            });
        }

        tools
    }

    /// Run tool `name` with JSON `arguments`. Always yields text for the model.
    #[instrument(skip(self, arguments))]
    pub async fn invoke(&self, name: &str, arguments: &str) -> String {
        match self.dispatch(name, arguments).await {
            Ok(output) => {
                info!(len = output.len(), "tool finished");
                output
            }
            Err(e) => {
                warn!(error = %e, "tool failed");
                format!("Error running {name}: {e}")
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: &str) -> Result<String> {
        let args = parse_arguments(arguments)?;

        match name {
            TRENDING_TOPICS => self.content.trending_topics().await,
            RESEARCH_TOPIC => self.content.research_topic(str_arg(&args, "topic")?).await,
            GENERATE_BLOG => Ok(self
                .content
                .generate_blog(str_arg(&args, "title")?, str_arg(&args, "content")?)),
            GENERATE_BLOG_FROM_TOPIC => {
                let tone = tone_arg(&args);
                self.content
                    .generate_blog_from_topic(str_arg(&args, "topic")?, tone)
                    .await
            }
            POST_DRAFT => {
                let ghost = self.ghost.as_ref().ok_or_else(|| {
                    GhostwriterError::config("Ghost publishing is not configured")
                })?;
                let title = str_arg(&args, "title")?;
                let content = args
                    .get("content")
                    .ok_or_else(|| GhostwriterError::validation("missing argument `content`"))?;
                Ok(ghost.publish_draft(title, content).await?.message())
            }
            EXECUTE_PYTHON => {
                let sandbox = self.sandbox.as_ref().ok_or_else(|| {
                    GhostwriterError::config("code execution is not configured")
                })?;
                let code = str_arg(&args, "code")?;
                let outcome = sandbox.execute(&ExecutionRequest::python(code)).await?;
                Ok(format!("Execution Result:\n{}", outcome.to_message()))
            }
            other => Err(GhostwriterError::validation(format!("unknown tool `{other}`"))),
        }
    }
}

/// Models sometimes send an empty string for argument-less calls.
fn parse_arguments(arguments: &str) -> Result<Value> {
    if arguments.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(arguments)
        .map_err(|e| GhostwriterError::parse(format!("invalid tool arguments: {e}")))
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| GhostwriterError::validation(format!("missing argument `{key}`")))
}

fn tone_arg(args: &Value) -> Tone {
    match args.get("tone").and_then(Value::as_str) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(tone = raw, "unknown tone, using default");
            Tone::default()
        }),
        None => Tone::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn offline() -> Toolbox {
        Toolbox::new(ContentTools::offline(), None, None)
    }

    fn names(toolbox: &Toolbox) -> Vec<&'static str> {
        toolbox.definitions().iter().map(|t| t.name).collect()
    }

    #[test]
    fn code_tool_offered_only_with_sandbox() {
        assert!(!names(&offline()).contains(&EXECUTE_PYTHON));

        let sandbox = Judge0Client::new(
            "k",
            Judge0Options {
                api_url: "http://localhost".into(),
                api_host: "h".into(),
                poll_interval: Duration::from_millis(1),
                max_polls: 1,
            },
        )
        .unwrap();
        let toolbox = Toolbox::new(ContentTools::offline(), None, Some(sandbox));
        assert!(names(&toolbox).contains(&EXECUTE_PYTHON));
    }

    #[test]
    fn tool_names_follow_plugin_function_pattern() {
        for name in names(&offline()) {
            let (plugin, function) = name.split_once('-').unwrap();
            assert!(!plugin.is_empty() && !function.is_empty());
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_error_text() {
        let out = offline().invoke("content-nope", "{}").await;
        assert!(out.starts_with("Error running content-nope:"));
        assert!(out.contains("unknown tool"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_error_text() {
        let out = offline().invoke(RESEARCH_TOPIC, "{not json").await;
        assert!(out.contains("invalid tool arguments"));

        let out = offline().invoke(RESEARCH_TOPIC, "{}").await;
        assert!(out.contains("missing argument `topic`"));
    }

    #[tokio::test]
    async fn empty_arguments_allowed_for_trending_topics() {
        let out = offline().invoke(TRENDING_TOPICS, "").await;
        assert!(out.starts_with("1. "));
    }

    #[tokio::test]
    async fn generate_blog_uses_template() {
        let out = offline()
            .invoke(GENERATE_BLOG, r#"{"title":"Hello","content":"Body"}"#)
            .await;
        assert!(out.starts_with("# Hello\n"));
        assert!(out.contains("## Main Content\nBody"));
    }

    #[tokio::test]
    async fn unknown_tone_falls_back_to_default() {
        let out = offline()
            .invoke(GENERATE_BLOG_FROM_TOPIC, r#"{"topic":"AI","tone":"poetic"}"#)
            .await;
        assert!(out.starts_with("# AI\n"));
        assert!(out.contains("A technical look at AI"));
    }

    #[tokio::test]
    async fn post_draft_without_ghost_is_error_text() {
        let out = offline()
            .invoke(POST_DRAFT, r#"{"title":"T","content":"Body"}"#)
            .await;
        assert!(out.contains("Ghost publishing is not configured"));
    }

    #[tokio::test]
    async fn post_draft_accepts_content_object() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ghost/api/admin/posts"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let ghost =
            GhostClient::new(&server.uri(), "abc123:00112233445566778899aabbccddeeff").unwrap();
        let toolbox = Toolbox::new(ContentTools::offline(), Some(ghost), None);

        let out = toolbox
            .invoke(POST_DRAFT, r##"{"title":"My Post","content":{"content":"# Hi\n\nThere"}}"##)
            .await;
        assert_eq!(out, "Successfully created the blog draft: My Post");

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body["posts"][0]["lexical"],
            ghostwriter_lexical::build("# Hi\n\nThere")
        );
    }

    #[tokio::test]
    async fn execute_python_prefixes_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/submissions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "t" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/submissions/t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": { "id": 3, "description": "Accepted" },
                "stdout": "4\n"
            })))
            .mount(&server)
            .await;

        let sandbox = Judge0Client::new(
            "k",
            Judge0Options {
                api_url: server.uri(),
                api_host: "h".into(),
                poll_interval: Duration::from_millis(1),
                max_polls: 5,
            },
        )
        .unwrap();
        let toolbox = Toolbox::new(ContentTools::offline(), None, Some(sandbox));

        let out = toolbox
            .invoke(EXECUTE_PYTHON, r#"{"code":"print(2 + 2)"}"#)
            .await;
        assert_eq!(out, "Execution Result:\n4\n");
    }
}
