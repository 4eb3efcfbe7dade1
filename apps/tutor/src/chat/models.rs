//! Transcript model: the ordered, append-only record of a chat session.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

/// Display and storage format for turn timestamps (second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used in headers: `User` or `AI`.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "AI",
        }
    }
}

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    text: String,
    #[serde(with = "timestamp_format")]
    timestamp: NaiveDateTime,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: truncate_to_seconds(timestamp),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// Accepts the record form `{role, text, timestamp}` as well as the legacy
/// `[role, text, timestamp]` triple written by earlier versions of the tutor.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTurn {
    Record {
        role: Role,
        text: String,
        #[serde(with = "timestamp_format")]
        timestamp: NaiveDateTime,
    },
    Triple(
        Role,
        String,
        #[serde(with = "timestamp_format")] NaiveDateTime,
    ),
}

impl<'de> Deserialize<'de> for Turn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredTurn::deserialize(deserializer)? {
            StoredTurn::Record {
                role,
                text,
                timestamp,
            } => Turn::new(role, text, timestamp),
            StoredTurn::Triple(role, text, timestamp) => Turn::new(role, text, timestamp),
        })
    }
}

/// Ordered sequence of turns: insertion order is display and export order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in insertion order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Current local time at second precision.
pub fn now_timestamp() -> NaiveDateTime {
    truncate_to_seconds(Local::now().naive_local())
}

fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) fn ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = Transcript::new();
        for i in 0..25 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            transcript.append(Turn::new(role, format!("turn {i}"), ts("2024-01-01 10:00:00")));
        }
        assert_eq!(transcript.len(), 25);
        let texts: Vec<&str> = transcript.all().iter().map(Turn::text).collect();
        let expected: Vec<String> = (0..25).map(|i| format!("turn {i}")).collect();
        assert_eq!(texts, expected);
        assert_eq!(transcript.all().last().unwrap().text(), "turn 24");
    }

    #[test]
    fn test_new_transcript_is_empty() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert!(transcript.all().is_empty());
        assert!(transcript.all().last().is_none());
    }

    #[test]
    fn test_turn_serializes_as_record() {
        let turn = Turn::new(Role::User, "What is overfitting?", ts("2024-01-01 10:00:00"));
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "role": "user",
                "text": "What is overfitting?",
                "timestamp": "2024-01-01 10:00:00"
            })
        );
    }

    #[test]
    fn test_turn_deserializes_legacy_triple() {
        let turn: Turn =
            serde_json::from_str(r#"["assistant", "Overfitting is...", "2024-01-01 10:00:01"]"#)
                .unwrap();
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.text(), "Overfitting is...");
        assert_eq!(turn.timestamp(), ts("2024-01-01 10:00:01"));
    }

    #[test]
    fn test_turn_rejects_bad_timestamp() {
        let result: Result<Turn, _> = serde_json::from_str(
            r#"{"role":"user","text":"hi","timestamp":"yesterday"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_timestamp_truncated_to_seconds() {
        let precise = ts("2024-01-01 10:00:00").with_nanosecond(123_456_789).unwrap();
        let turn = Turn::new(Role::User, "hi", precise);
        assert_eq!(turn.timestamp(), ts("2024-01-01 10:00:00"));
        assert_eq!(now_timestamp().nanosecond(), 0);
    }
}
