//! Topic discovery, research and blog drafting.
//!
//! Each search API is optional. Without a SerpApi key trending topics come
//! from a curated list, and without a Tavily key research is a canned
//! outline, so the assistant stays usable offline.

use tracing::{debug, info, instrument, warn};

use ghostwriter_research::{SerpClient, TavilyClient, TavilyOptions};
use ghostwriter_shared::{ResearchConfig, Result, Tone, env_value};

/// Topics offered when SerpApi is unavailable or returns nothing.
pub const CURATED_TOPICS: &[&str] = &[
    "AI Security in Cloud Computing",
    "Zero Trust Architecture",
    "Machine Learning for Threat Detection",
    "AI Governance and Regulation",
    "Quantum Computing Security",
    "Large Language Models for Security",
    "Large Language Models pentesting",
    "The threat Landscape of Enterprise AI",
    "Blue Teaming with Large Language Models",
    "Red Teaming with Large Language Models",
];

const BLOG_FOOTER: &str = "This blog post was generated using AI-powered tools.";

/// Render topics as `1. First\n2. Second`.
pub fn numbered_list<S: AsRef<str>>(topics: &[S]) -> String {
    topics
        .iter()
        .enumerate()
        .map(|(i, topic)| format!("{}. {}", i + 1, topic.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Research outline used when no Tavily key is configured.
pub fn mock_research(topic: &str) -> String {
    format!(
        "Here's what we know about {topic}:\n\
         \n\
         Key Points:\n\
         - Latest trends and developments\n\
         - Expert insights and analysis\n\
         - Real-world applications\n\
         - Future implications\n\
         \n\
         The field of {topic} is rapidly evolving, with new developments emerging regularly.\n\
         Experts suggest focusing on practical implementations while keeping security in mind."
    )
}

/// Wrap `content` in the blog skeleton. Without a tone the introduction is
/// the neutral one.
pub fn render_blog(title: &str, content: &str, tone: Option<Tone>) -> String {
    let introduction = match tone {
        None => format!(
            "An engaging introduction to {title}, highlighting its significance in today's rapidly evolving tech landscape."
        ),
        Some(Tone::Technical) => format!(
            "A technical look at {title}, covering how it works and why it matters in today's rapidly evolving tech landscape."
        ),
        Some(Tone::Professional) => format!(
            "An overview of {title} and what it means for organisations navigating today's tech landscape."
        ),
        Some(Tone::Casual) => {
            format!("Let's dig into {title} and why everyone is talking about it right now.")
        }
    };

    format!(
        "# {title}\n\
         \n\
         ## Introduction\n\
         {introduction}\n\
         \n\
         ## Main Content\n\
         {content}\n\
         \n\
         ## Conclusion\n\
         A thoughtful conclusion that summarizes key points and looks toward future developments.\n\
         \n\
         ---\n\
         {BLOG_FOOTER}\n"
    )
}

/// The `content-*` tools.
pub struct ContentTools {
    serp: Option<SerpClient>,
    tavily: Option<TavilyClient>,
    trending_query: String,
}

impl ContentTools {
    pub fn new(
        serp: Option<SerpClient>,
        tavily: Option<TavilyClient>,
        trending_query: impl Into<String>,
    ) -> Self {
        Self {
            serp,
            tavily,
            trending_query: trending_query.into(),
        }
    }

    /// Build clients for whichever API keys are present in the environment.
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let serp = match env_value(&config.serpapi_key_env) {
            Some(key) => Some(SerpClient::new(key, config.max_results)?),
            None => {
                warn!(
                    env = %config.serpapi_key_env,
                    "SerpApi key not set, trending topics will use the curated list"
                );
                None
            }
        };

        let tavily = match env_value(&config.tavily_key_env) {
            Some(key) => Some(TavilyClient::new(
                key,
                TavilyOptions {
                    max_results: config.max_results,
                    include_domains: config.include_domains.clone(),
                    exclude_domains: config.exclude_domains.clone(),
                },
            )?),
            None => {
                warn!(
                    env = %config.tavily_key_env,
                    "Tavily key not set, research will use example data"
                );
                None
            }
        };

        Ok(Self::new(serp, tavily, config.trending_query.clone()))
    }

    /// Neither search API configured.
    pub fn offline() -> Self {
        Self::new(None, None, String::new())
    }

    /// Numbered list of trending topics.
    #[instrument(skip(self))]
    pub async fn trending_topics(&self) -> Result<String> {
        if let Some(serp) = &self.serp {
            let topics = serp.trending_topics(&self.trending_query).await?;
            if !topics.is_empty() {
                info!(count = topics.len(), "found trending topics");
                return Ok(numbered_list(&topics));
            }
            warn!("SerpApi returned no results, falling back to curated topics");
        }

        Ok(numbered_list(CURATED_TOPICS))
    }

    /// Research text for `topic`.
    #[instrument(skip(self))]
    pub async fn research_topic(&self, topic: &str) -> Result<String> {
        let research = match &self.tavily {
            Some(tavily) => tavily.research(topic).await?.to_text(),
            None => {
                warn!("using mock research data");
                mock_research(topic)
            }
        };
        debug!(len = research.len(), "research complete");
        Ok(research)
    }

    pub fn generate_blog(&self, title: &str, content: &str) -> String {
        info!(title, "generating blog post");
        render_blog(title, content, None)
    }

    /// Research `topic`, then draft a post about it.
    #[instrument(skip(self))]
    pub async fn generate_blog_from_topic(&self, topic: &str, tone: Tone) -> Result<String> {
        let research = self.research_topic(topic).await?;
        Ok(render_blog(topic, &research, Some(tone)))
    }
}
