//! Storage trait - abstraction boundary for registry persistence.
//!
//! The registry needs one durable record per participant, plus a single
//! slot for the registration flag and one for the assignment mapping.
//! Implementations:
//!
//! - [`MemoryStorage`]: process-local, for tests and dry runs
//! - [`JsonDirStorage`]: one JSON file per participant under a data directory
//! - [`SqliteStorage`]: a single `SQLite` database file

use std::sync::Arc;

use thiserror::Error;

use crate::{
    assignment::Assignment,
    config::{Config, StorageBackend},
    participant::{Participant, ParticipantId},
};

mod json_dir;
mod memory;
mod sqlite;

pub use json_dir::JsonDirStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Persistence failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Filesystem access failed
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// A stored record could not be decoded
    #[error("malformed record {what}: {message}")]
    Malformed { what: String, message: String },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(String),

    /// Store is held by another process
    #[error("storage is locked: {0}")]
    Locked(String),
}

impl StorageError {
    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Malformed {
            what: what.into(),
            message: message.to_string(),
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Trait defining the persistence boundary for the registry.
///
/// `load_*` methods are called once at startup; the `save`/`delete` methods
/// are called under the orchestrator lock after every mutation.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Load every stored participant in registration order.
    async fn load_all(&self) -> StorageResult<Vec<Participant>>;

    /// Create or overwrite the record for `participant.id`.
    async fn save(&self, participant: &Participant) -> StorageResult<()>;

    /// Remove the record for `id`. Removing an absent record is not an error.
    async fn delete(&self, id: &ParticipantId) -> StorageResult<()>;

    /// Load the registration-open flag.
    async fn load_flag(&self) -> StorageResult<bool>;

    /// Persist the registration-open flag.
    async fn save_flag(&self, open: bool) -> StorageResult<()>;

    /// Load the assignment mapping (empty if never computed).
    async fn load_mapping(&self) -> StorageResult<Assignment>;

    /// Persist the assignment mapping.
    async fn save_mapping(&self, mapping: &Assignment) -> StorageResult<()>;
}

/// Open the backend selected by `config`.
pub async fn open_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::with_flag(config.open_on_init)),
        StorageBackend::Json => {
            Arc::new(JsonDirStorage::open(&config.data_dir, config.open_on_init).await?)
        }
        StorageBackend::Sqlite => Arc::new(
            SqliteStorage::open(&config.data_dir.join("santa.db"), config.open_on_init).await?,
        ),
    };
    tracing::info!(backend = %config.backend, data_dir = %config.data_dir.display(), "storage opened");
    Ok(storage)
}
