//! Core domain types shared by the Ghostwriter crates.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GhostwriterError;

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse an RFC 3339 timestamp, or a zone-less ISO 8601 one
/// (`2024-11-20T10:15:30.123456`) taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

/// `deserialize_with` helper accepting every format [`parse_timestamp`] does.
pub fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

// ---------------------------------------------------------------------------
// ChatRole / ChatMessage
// ---------------------------------------------------------------------------

/// Author of a persisted chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the persisted chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tone
// ---------------------------------------------------------------------------

/// Writing tone requested for a generated post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Casual,
    #[default]
    Technical,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Technical => "technical",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tone {
    type Err = GhostwriterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(Self::Professional),
            "casual" => Ok(Self::Casual),
            "technical" => Ok(Self::Technical),
            other => Err(GhostwriterError::validation(format!(
                "unknown tone '{other}': expected professional, casual, or technical"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_serialization() {
        let msg = ChatMessage::new(ChatRole::Assistant, "hello");
        let json = serde_json::to_string(&msg).expect("serialize");
        assert!(json.contains(r#""role":"assistant""#));
        let parsed: ChatMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, msg);
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let json = r#"{"role":"user","content":"hi","timestamp":"2024-11-20T10:15:30.123456"}"#;
        let msg: ChatMessage = serde_json::from_str(json).expect("deserialize");
        assert_eq!(msg.timestamp.to_rfc3339(), "2024-11-20T10:15:30.123456+00:00");

        let whole_seconds = parse_timestamp("2024-11-20T10:15:30").unwrap();
        assert_eq!(whole_seconds.to_rfc3339(), "2024-11-20T10:15:30+00:00");
    }

    #[test]
    fn offset_timestamps_convert_to_utc() {
        let ts = parse_timestamp("2024-11-20T12:15:30+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-11-20T10:15:30+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn tone_parsing() {
        assert_eq!("Casual".parse::<Tone>().unwrap(), Tone::Casual);
        assert_eq!(" technical ".parse::<Tone>().unwrap(), Tone::Technical);
        assert!("sarcastic".parse::<Tone>().is_err());
        assert_eq!(Tone::default(), Tone::Technical);
    }
}
