//! `SQLite` storage using `SQLx`
//!
//! Simple embedded schema (no migration files). Registration order is the
//! autoincrement `seq` column.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{Storage, StorageError, StorageResult};
use crate::{
    assignment::Assignment,
    participant::{Participant, ParticipantId, ParticipantRecord},
};

const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Database schema as SQL string - executed once on open
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY CHECK(version = 1)
);

CREATE TABLE IF NOT EXISTS participants (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT UNIQUE NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    message TEXT NOT NULL DEFAULT '',
    registered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assignments (
    santa TEXT PRIMARY KEY,
    child TEXT NOT NULL
);
";

const REGISTRATION_OPEN_KEY: &str = "registration_open";

/// Database-backed storage with connection pooling
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open or create the database at `path`.
    ///
    /// A fresh database starts with `registration_open = open_on_init`.
    pub async fn open(path: &Path, open_on_init: bool) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, &e))?;
        }

        let path_str = path.to_str().ok_or_else(|| {
            StorageError::Database("Database path contains invalid UTF-8".to_string())
        })?;
        let db_url = if path.is_absolute() {
            format!("sqlite://{path_str}?mode=rwc")
        } else {
            format!("sqlite:{path_str}?mode=rwc")
        };

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(|e| StorageError::Database(format!("Failed to connect to database: {e}")))?;

        init_schema(&pool, open_on_init).await?;
        check_schema_version(&pool).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Initialize database schema and default settings
async fn init_schema(pool: &SqlitePool, open_on_init: bool) -> StorageResult<()> {
    sqlx::query(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Database(format!("Failed to initialize schema: {e}")))?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(CURRENT_SCHEMA_VERSION)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Database(format!("Failed to set schema version: {e}")))?;

    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(REGISTRATION_OPEN_KEY)
        .bind(open_on_init.to_string())
        .execute(pool)
        .await
        .map_err(|e| StorageError::Database(format!("Failed to seed settings: {e}")))?;

    Ok(())
}

/// Check database schema version matches expected
async fn check_schema_version(pool: &SqlitePool) -> StorageResult<()> {
    let version: Option<i64> = sqlx::query("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await?
        .map(|row| row.try_get("version"))
        .transpose()?;

    match version {
        Some(v) if v == CURRENT_SCHEMA_VERSION => Ok(()),
        Some(v) => Err(StorageError::Database(format!(
            "Schema version mismatch: database has version {v}, expected {CURRENT_SCHEMA_VERSION}"
        ))),
        None => Err(StorageError::Database(
            "Schema version not found in database".to_string(),
        )),
    }
}

/// Parse a database row into a `Participant`
#[allow(clippy::needless_pass_by_value)]
fn parse_participant_row(row: SqliteRow) -> StorageResult<Participant> {
    let id: String = row.try_get("id")?;
    let registered_at: String = row.try_get("registered_at")?;
    let registered_at = DateTime::parse_from_rfc3339(&registered_at)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::malformed(format!("participant '{id}'"), e))?;

    let record = ParticipantRecord {
        id: id.clone(),
        address: row.try_get("address")?,
        message: row.try_get("message")?,
        registered_at,
    };
    Participant::try_from(record).map_err(|e| StorageError::malformed(format!("participant '{id}'"), e))
}

#[async_trait::async_trait]
impl Storage for SqliteStorage {
    async fn load_all(&self) -> StorageResult<Vec<Participant>> {
        sqlx::query("SELECT id, address, message, registered_at FROM participants ORDER BY seq")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(parse_participant_row)
            .collect()
    }

    async fn save(&self, participant: &Participant) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO participants (id, address, message, registered_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET address = excluded.address, message = excluded.message",
        )
        .bind(participant.id.as_str())
        .bind(&participant.address)
        .bind(&participant.message)
        .bind(participant.registered_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| StorageError::Database(format!("Failed to save '{}': {e}", participant.id)))
    }

    async fn delete(&self, id: &ParticipantId) -> StorageResult<()> {
        sqlx::query("DELETE FROM participants WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::Database(format!("Failed to delete '{id}': {e}")))
    }

    async fn load_flag(&self) -> StorageResult<bool> {
        let value: String = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(REGISTRATION_OPEN_KEY)
            .fetch_one(&self.pool)
            .await?
            .try_get("value")?;

        value
            .parse()
            .map_err(|e| StorageError::malformed(REGISTRATION_OPEN_KEY, e))
    }

    async fn save_flag(&self, open: bool) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(REGISTRATION_OPEN_KEY)
        .bind(open.to_string())
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| StorageError::Database(format!("Failed to save settings: {e}")))
    }

    async fn load_mapping(&self) -> StorageResult<Assignment> {
        sqlx::query("SELECT santa, child FROM assignments")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| -> StorageResult<(ParticipantId, ParticipantId)> {
                let santa: String = row.try_get("santa")?;
                let child: String = row.try_get("child")?;
                let parse = |raw: &str| {
                    ParticipantId::parse(raw)
                        .map_err(|e| StorageError::malformed(format!("assignment '{raw}'"), e))
                };
                Ok((parse(&santa)?, parse(&child)?))
            })
            .collect()
    }

    async fn save_mapping(&self, mapping: &Assignment) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM assignments")
            .execute(&mut *tx)
            .await?;
        for (santa, child) in mapping.iter() {
            sqlx::query("INSERT INTO assignments (santa, child) VALUES (?, ?)")
                .bind(santa.as_str())
                .bind(child.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
