//! Participant records
//!
//! A [`Participant`] is owned by the [`Registry`](crate::registry::Registry);
//! everything outside it works on clones. Stored records are decoded through
//! [`ParticipantRecord`] so a malformed file never produces a half-built
//! participant.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

const MAX_ID_LEN: usize = 64;

/// Validated participant identity (a chat username without the `@`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Parse and validate an identity.
    ///
    /// A single leading `@` is stripped. The remainder must be 1 to 64 ASCII
    /// alphanumerics, `_`, `-` or `.`, and must not start with `.`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let id = trimmed.strip_prefix('@').unwrap_or(trimmed);

        if id.is_empty() {
            return Err(Error::InvalidId("identifier cannot be empty".to_string()));
        }
        if id.len() > MAX_ID_LEN {
            return Err(Error::InvalidId(format!(
                "'{id}' is longer than {MAX_ID_LEN} characters"
            )));
        }
        if id.starts_with('.') {
            return Err(Error::InvalidId(format!("'{id}' cannot start with '.'")));
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(Error::InvalidId(format!(
                "'{id}' contains invalid character '{bad}'"
            )));
        }

        Ok(Self(id.to_string()))
    }

    /// Get the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

/// Pending free-text field for a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum InputMode {
    /// Next free text is not captured
    #[default]
    None,
    /// Next free text becomes the address
    AwaitingAddress,
    /// Next free text becomes the message to the santa
    AwaitingMessage,
}

/// A registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ParticipantRecord", into = "ParticipantRecord")]
pub struct Participant {
    /// Identity, immutable once created
    pub id: ParticipantId,
    /// Postal address; empty until provided
    pub address: String,
    /// Message to the santa; empty means none
    pub message: String,
    /// When the participant registered
    pub registered_at: DateTime<Utc>,
    /// Transient input mode, never persisted
    pub input_mode: InputMode,
}

impl Participant {
    /// Create a freshly registered participant
    #[must_use]
    pub fn new(id: ParticipantId) -> Self {
        Self {
            id,
            address: String::new(),
            message: String::new(),
            registered_at: Utc::now(),
            input_mode: InputMode::None,
        }
    }

    /// Whether an address is on file
    #[must_use]
    pub fn has_address(&self) -> bool {
        !self.address.is_empty()
    }

    /// Whether a message for the santa is on file
    #[must_use]
    pub fn has_message(&self) -> bool {
        !self.message.is_empty()
    }
}

/// On-disk shape of a participant
///
/// Every field is required; a record missing one fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticipantRecord {
    pub id: String,
    pub address: String,
    pub message: String,
    pub registered_at: DateTime<Utc>,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = Error;

    fn try_from(record: ParticipantRecord) -> Result<Self> {
        Ok(Self {
            id: ParticipantId::parse(&record.id)?,
            address: record.address,
            message: record.message,
            registered_at: record.registered_at,
            input_mode: InputMode::None,
        })
    }
}

impl From<Participant> for ParticipantRecord {
    fn from(participant: Participant) -> Self {
        Self {
            id: participant.id.into(),
            address: participant.address,
            message: participant.message,
            registered_at: participant.registered_at,
        }
    }
}

/// Fold line breaks into spaces so a value stays on one line
#[must_use]
pub fn single_line(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_at_sign() {
        let id = ParticipantId::parse("@alice").unwrap();
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn test_parse_rejects_path_like_ids() {
        assert!(ParticipantId::parse("../etc").is_err());
        assert!(ParticipantId::parse("a/b").is_err());
        assert!(ParticipantId::parse(".hidden").is_err());
        assert!(ParticipantId::parse("").is_err());
        assert!(ParticipantId::parse("@").is_err());
        assert!(ParticipantId::parse("two words").is_err());
    }

    #[test]
    fn test_parse_rejects_overlong_ids() {
        let long = "a".repeat(MAX_ID_LEN + 1);
        assert!(matches!(
            ParticipantId::parse(&long),
            Err(Error::InvalidId(_))
        ));
    }

    #[test]
    fn test_record_round_trip_drops_input_mode() {
        let mut participant = Participant::new(ParticipantId::parse("bob").unwrap());
        participant.address = "1 Main St".to_string();
        participant.input_mode = InputMode::AwaitingMessage;

        let json = serde_json::to_string(&participant).unwrap();
        assert!(!json.contains("input_mode"));

        let decoded: Participant = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, participant.id);
        assert_eq!(decoded.address, "1 Main St");
        assert_eq!(decoded.input_mode, InputMode::None);
    }

    #[test]
    fn test_malformed_record_is_rejected() {
        let missing_field = r#"{"id": "bob", "address": ""}"#;
        assert!(serde_json::from_str::<Participant>(missing_field).is_err());

        let bad_id = r#"{"id": "b/ob", "address": "", "message": "", "registered_at": "2024-12-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Participant>(bad_id).is_err());
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("a\nb\r\nc"), "a b  c");
    }

    #[test]
    fn test_input_mode_names() {
        assert_eq!(InputMode::AwaitingAddress.to_string(), "awaiting_address");
        assert_eq!(InputMode::default(), InputMode::None);
    }
}
