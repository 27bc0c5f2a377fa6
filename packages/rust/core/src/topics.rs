use std::sync::LazyLock;

use regex::Regex;

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?\s+(.+)$").expect("valid regex"));

/// Pull the items of a numbered list out of an assistant reply.
///
/// Markdown emphasis, heading and code markers are stripped from each item;
/// lines that are not numbered are ignored.
pub fn extract_topics(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| NUMBERED_LINE.captures(line.trim()))
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .chars()
                .filter(|c| !matches!(c, '*' | '#' | '`'))
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|topic| !topic.is_empty())
        .collect()
}
