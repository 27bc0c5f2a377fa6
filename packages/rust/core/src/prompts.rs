//! System instructions and the canned user prompts behind CLI commands.

use ghostwriter_shared::Tone;

pub const AGENT_INSTRUCTIONS: &str = "\
You are an AI blogging assistant that specializes in creating high-quality blog posts about AI and security topics.
Your workflow involves:
1. Finding trending topics using SERP API
2. Researching topics in depth using Tavily
3. Generating well-structured blog posts
4. Publishing drafts to Ghost blog platform

Always maintain a professional tone and ensure all content is properly sourced.
When generating blog posts, include:
- Engaging titles
- Clear introduction
- Well-structured main content
- Proper conclusion
- Source citations

When listing topics, use a numbered list with one topic per line.";

pub fn trending_topics() -> String {
    "Find trending topics".to_string()
}

pub fn research(topic: &str) -> String {
    format!("Research the topic: {topic}")
}

pub fn blog(topic: &str, tone: Tone) -> String {
    format!("Generate a {tone} blog post about: {topic}")
}

/// With content the agent posts it as-is; without, it writes the post first.
pub fn publish(title: &str, content: Option<&str>) -> String {
    match content {
        Some(content) => format!("Post this content as a draft titled '{title}': {content}"),
        None => format!("Generate and post a draft blog about: {title}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_wording() {
        assert_eq!(trending_topics(), "Find trending topics");
        assert_eq!(research("Zero Trust"), "Research the topic: Zero Trust");
        assert_eq!(
            blog("Zero Trust", Tone::Casual),
            "Generate a casual blog post about: Zero Trust"
        );
        assert_eq!(
            publish("Hello", Some("# Hi")),
            "Post this content as a draft titled 'Hello': # Hi"
        );
        assert_eq!(
            publish("Hello", None),
            "Generate and post a draft blog about: Hello"
        );
    }

    #[test]
    fn trending_prompt_triggers_topic_capture() {
        assert!(trending_topics().to_lowercase().contains("trending topics"));
    }
}
