//! Plain text to Ghost Lexical document conversion.
//!
//! Blog drafts arrive as loosely formatted Markdown: blank-line separated
//! blocks, with `#` lines as headings. [`build`] turns that text into the
//! Lexical JSON tree Ghost stores in a post's `lexical` field.
//!
//! The conversion is total: every input yields a document, malformed text
//! degrading into plain paragraphs.

mod node;

use tracing::{debug, instrument, trace};

pub use node::{
    Block, Heading, HeadingTag, LexicalDocument, MAX_HEADING_LEVEL, Paragraph, Root, TextRun,
};

/// Separator between text blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Content handed to the builder: raw text, or an envelope carrying a
/// `content` field (the shape model tool calls often produce).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexicalInput {
    Text(String),
    Envelope { content: String },
}

impl LexicalInput {
    /// The text to convert.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Envelope { content } => content,
        }
    }
}

impl From<&str> for LexicalInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for LexicalInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for LexicalInput {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self::Text(text),
            serde_json::Value::Object(mut map) if map.contains_key("content") => {
                let content = map.remove("content").map(value_to_text).unwrap_or_default();
                Self::Envelope { content }
            }
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&serde_json::Value> for LexicalInput {
    fn from(value: &serde_json::Value) -> Self {
        Self::from(value.clone())
    }
}

fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Convert content to a serialized Lexical document.
pub fn build(content: impl Into<LexicalInput>) -> String {
    build_tree(content).to_json()
}

/// Convert content to a typed Lexical document.
///
/// 1. Split the trimmed text on blank lines
/// 2. Drop blocks that are empty after trimming
/// 3. Blocks starting with `#` become a heading, plus a paragraph for any
///    lines following the heading line
/// 4. Every other block becomes a single paragraph
#[instrument(skip_all)]
pub fn build_tree(content: impl Into<LexicalInput>) -> LexicalDocument {
    let text = content.into().into_text();
    let text = text.trim();

    let mut children = Vec::new();
    let mut block_count = 0usize;

    for block in text.split(BLOCK_SEPARATOR) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        block_count += 1;

        if block.starts_with('#') {
            let (first_line, rest) = block.split_once('\n').unwrap_or((block, ""));
            let level = heading_level(first_line);
            let heading_text = first_line.trim_start_matches('#').trim();

            trace!(level, text = heading_text, "heading block");
            children.push(Block::heading(level, heading_text));

            let rest = rest.trim();
            if !rest.is_empty() {
                children.push(Block::paragraph(rest));
            }
        } else {
            trace!(len = block.len(), "paragraph block");
            children.push(Block::paragraph(block));
        }
    }

    debug!(
        input_len = text.len(),
        blocks = block_count,
        nodes = children.len(),
        "lexical document built"
    );

    LexicalDocument::new(children)
}

/// Count the `#` run opening the first token, clamped to `1..=6`.
fn heading_level(first_line: &str) -> u8 {
    let token = first_line.split_whitespace().next().unwrap_or_default();
    let hashes = token.chars().take_while(|&c| c == '#').count();
    hashes.clamp(1, usize::from(MAX_HEADING_LEVEL)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(doc: &LexicalDocument) -> Vec<(Option<u8>, String)> {
        doc.blocks()
            .iter()
            .map(|b| match b {
                Block::Heading(h) => (Some(h.tag.level()), b.text()),
                Block::Paragraph(_) => (None, b.text()),
            })
            .collect()
    }

    #[test]
    fn single_paragraph() {
        let doc = build_tree("  Just one line of text.\nAnd a second line.  ");
        assert_eq!(
            shape(&doc),
            vec![(None, "Just one line of text.\nAnd a second line.".to_string())]
        );
    }

    #[test]
    fn heading_then_body() {
        let doc = build_tree("# Title\n\nBody text");
        assert_eq!(
            shape(&doc),
            vec![
                (Some(1), "Title".to_string()),
                (None, "Body text".to_string())
            ]
        );
    }

    #[test]
    fn heading_with_trailing_lines() {
        let doc = build_tree("## Sub\nmore on same line");
        assert_eq!(
            shape(&doc),
            vec![
                (Some(2), "Sub".to_string()),
                (None, "more on same line".to_string())
            ]
        );
    }

    #[test]
    fn heading_with_blank_remainder_has_no_paragraph() {
        let doc = build_tree("### Only\n   ");
        assert_eq!(shape(&doc), vec![(Some(3), "Only".to_string())]);
    }

    #[test]
    fn whitespace_only_is_empty_root() {
        for input in ["", "   ", "\n\n\n\n", " \n \n\t\n"] {
            assert!(build_tree(input).blocks().is_empty(), "input {input:?}");
        }
        assert_eq!(
            build("\n\n"),
            r#"{"root":{"type":"root","format":"","indent":0,"version":1,"children":[]}}"#
        );
    }

    #[test]
    fn blocks_keep_source_order() {
        let doc = build_tree("Alpha\n\nBeta\n\n\n\nGamma");
        assert_eq!(
            shape(&doc),
            vec![
                (None, "Alpha".to_string()),
                (None, "Beta".to_string()),
                (None, "Gamma".to_string())
            ]
        );
    }

    #[test]
    fn heading_levels_clamp_to_six() {
        assert_eq!(heading_level("######## Deep"), 6);
        assert_eq!(heading_level("###### Six"), 6);
        assert_eq!(heading_level("## Two"), 2);
    }

    #[test]
    fn heading_level_counts_only_hashes() {
        assert_eq!(heading_level("#Title"), 1);
        assert_eq!(heading_level("##Sub heading"), 2);

        let doc = build_tree("#Title");
        assert_eq!(shape(&doc), vec![(Some(1), "Title".to_string())]);
    }

    #[test]
    fn bare_hash_is_empty_heading() {
        let doc = build_tree("#\nbody");
        assert_eq!(
            shape(&doc),
            vec![(Some(1), String::new()), (None, "body".to_string())]
        );
    }

    #[test]
    fn envelope_matches_plain_text() {
        let envelope = serde_json::json!({ "content": "Hello", "topic": "ignored" });
        assert_eq!(build(envelope), build("Hello"));
    }

    #[test]
    fn other_json_is_stringified() {
        let input = LexicalInput::from(serde_json::json!(["a", "b"]));
        assert_eq!(input, LexicalInput::Text(r#"["a","b"]"#.to_string()));

        let input = LexicalInput::from(serde_json::json!({ "content": 42 }));
        assert_eq!(input.into_text(), "42");
    }

    #[test]
    fn serialization_is_stable() {
        let json = build("# Post\nIntro line\n\n## Section\n\nBody with \"quotes\" and émoji 🚀");
        let parsed: LexicalDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.to_json(), json);
        assert_eq!(parsed.blocks().len(), 4);
    }

    #[test]
    fn full_shape_of_heading_document() {
        assert_eq!(
            build("# Hi\n\nThere"),
            concat!(
                r#"{"root":{"type":"root","format":"","indent":0,"version":1,"children":["#,
                r#"{"type":"heading","tag":"h1","format":"","indent":0,"version":1,"children":["#,
                r#"{"type":"text","text":"Hi","format":0,"detail":0,"mode":"normal","style":""}]},"#,
                r#"{"type":"paragraph","format":"","indent":0,"version":1,"children":["#,
                r#"{"type":"text","text":"There","format":0,"detail":0,"mode":"normal","style":""}]}]}}"#
            )
        );
    }
}
