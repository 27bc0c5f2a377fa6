//! Typed Lexical node tree.
//!
//! Field declaration order is the JSON key order Ghost receives, so the
//! structs below must not be reordered.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Deepest heading Ghost renders (`h6`).
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Lexical node schema version emitted on every element node.
const NODE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Document / Root
// ---------------------------------------------------------------------------

/// Top-level Lexical document: `{"root": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalDocument {
    pub root: Root,
}

impl LexicalDocument {
    /// Wrap blocks in a root node.
    pub fn new(children: Vec<Block>) -> Self {
        Self {
            root: Root {
                format: String::new(),
                indent: 0,
                version: NODE_VERSION,
                children,
            },
        }
    }

    /// Top-level blocks in source order.
    pub fn blocks(&self) -> &[Block] {
        &self.root.children
    }

    /// Compact JSON, the form embedded in a Ghost post's `lexical` field.
    pub fn to_json(&self) -> String {
        // Plain structs with string keys: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Indented JSON for inspection.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "root")]
pub struct Root {
    pub format: String,
    pub indent: u32,
    pub version: u32,
    pub children: Vec<Block>,
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// A top-level node: heading or paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
}

impl Block {
    /// Build a heading block; `level` is clamped to `1..=6`.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading(Heading {
            tag: HeadingTag::new(level),
            format: String::new(),
            indent: 0,
            version: NODE_VERSION,
            children: vec![TextRun::new(text)],
        })
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(Paragraph {
            format: String::new(),
            indent: 0,
            version: NODE_VERSION,
            children: vec![TextRun::new(text)],
        })
    }

    /// Concatenated text of the block's runs.
    pub fn text(&self) -> String {
        let runs = match self {
            Self::Heading(h) => &h.children,
            Self::Paragraph(p) => &p.children,
        };
        runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub tag: HeadingTag,
    pub format: String,
    pub indent: u32,
    pub version: u32,
    pub children: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub format: String,
    pub indent: u32,
    pub version: u32,
    pub children: Vec<TextRun>,
}

// ---------------------------------------------------------------------------
// HeadingTag
// ---------------------------------------------------------------------------

/// Heading level, serialized as `"h1"`..`"h6"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadingTag(u8);

impl HeadingTag {
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, MAX_HEADING_LEVEL))
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Serialize for HeadingTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("h{}", self.0))
    }
}

impl<'de> Deserialize<'de> for HeadingTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.strip_prefix('h')
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=MAX_HEADING_LEVEL).contains(n))
            .map(Self)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid heading tag '{raw}'")))
    }
}

// ---------------------------------------------------------------------------
// TextRun
// ---------------------------------------------------------------------------

/// Unstyled text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "text")]
pub struct TextRun {
    pub text: String,
    pub format: u32,
    pub detail: u32,
    pub mode: String,
    pub style: String,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: 0,
            detail: 0,
            mode: "normal".into(),
            style: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_run_shape() {
        let json = serde_json::to_string(&TextRun::new("hi")).unwrap();
        assert_eq!(
            json,
            r#"{"type":"text","text":"hi","format":0,"detail":0,"mode":"normal","style":""}"#
        );
    }

    #[test]
    fn heading_shape() {
        let json = serde_json::to_string(&Block::heading(2, "Sub")).unwrap();
        assert!(json.starts_with(
            r#"{"type":"heading","tag":"h2","format":"","indent":0,"version":1,"children":["#
        ));
    }

    #[test]
    fn empty_document_shape() {
        assert_eq!(
            LexicalDocument::new(vec![]).to_json(),
            r#"{"root":{"type":"root","format":"","indent":0,"version":1,"children":[]}}"#
        );
    }

    #[test]
    fn heading_tag_clamps() {
        assert_eq!(HeadingTag::new(0).level(), 1);
        assert_eq!(HeadingTag::new(9).level(), 6);
    }

    #[test]
    fn heading_tag_rejects_garbage() {
        let err = serde_json::from_str::<HeadingTag>(r#""h7""#);
        assert!(err.is_err());
        let err = serde_json::from_str::<HeadingTag>(r#""title""#);
        assert!(err.is_err());
        let ok: HeadingTag = serde_json::from_str(r#""h3""#).unwrap();
        assert_eq!(ok.level(), 3);
    }
}
