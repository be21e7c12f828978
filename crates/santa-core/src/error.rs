//! Error types for santa-core
//!
//! Every variant except [`Error::Storage`] and [`Error::Config`] is a
//! recoverable, caller-facing condition: the orchestrator turns it into a
//! reply instead of aborting. [`ErrorKind`] is the machine-readable tag that
//! travels alongside the reply text.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::{participant::ParticipantId, storage::StorageError};

/// Core error type for registry and assignment operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Registration gate is closed
    #[error("registration is closed")]
    RegistrationClosed,

    /// Participant id already present in the registry
    #[error("participant '{0}' is already registered")]
    AlreadyRegistered(ParticipantId),

    /// Participant id absent from the registry (or from the assignment)
    #[error("participant '{0}' is not registered")]
    NotRegistered(ParticipantId),

    /// An assignment has already been computed and persisted
    #[error("the assignment has already been computed")]
    AlreadyAssigned,

    /// Derangement requested over fewer than two participants
    #[error("at least 2 participants are required, found {found}")]
    InsufficientParticipants {
        /// Number of participants that were available
        found: usize,
    },

    /// A mapped child is missing from the registry or has no address
    #[error("assigned participant '{0}' has no address on file")]
    InconsistentAssignment(ParticipantId),

    /// Identifier failed validation
    #[error("invalid participant id: {0}")]
    InvalidId(String),

    /// Persistence failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded or validated
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Machine-readable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RegistrationClosed => ErrorKind::RegistrationClosed,
            Self::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Self::NotRegistered(_) => ErrorKind::NotRegistered,
            Self::AlreadyAssigned => ErrorKind::AlreadyAssigned,
            Self::InsufficientParticipants { .. } => ErrorKind::InsufficientParticipants,
            Self::InconsistentAssignment(_) => ErrorKind::InconsistentAssignment,
            Self::InvalidId(_) => ErrorKind::InvalidId,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Machine-readable error tag exposed next to every reply
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RegistrationClosed,
    AlreadyRegistered,
    NotRegistered,
    AlreadyAssigned,
    InsufficientParticipants,
    InconsistentAssignment,
    InvalidId,
    Storage,
    Config,
}

/// Result type alias for santa-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Error::RegistrationClosed.kind(), ErrorKind::RegistrationClosed);
        assert_eq!(
            Error::InsufficientParticipants { found: 1 }.kind(),
            ErrorKind::InsufficientParticipants
        );
        assert_eq!(Error::AlreadyAssigned.kind(), ErrorKind::AlreadyAssigned);
    }

    #[test]
    fn test_kind_is_snake_case() {
        assert_eq!(ErrorKind::RegistrationClosed.to_string(), "registration_closed");
        assert_eq!(
            ErrorKind::from_str("inconsistent_assignment").ok(),
            Some(ErrorKind::InconsistentAssignment)
        );
    }

    #[test]
    fn test_display_mentions_count() {
        let err = Error::InsufficientParticipants { found: 1 };
        assert!(err.to_string().contains("found 1"));
    }
}
