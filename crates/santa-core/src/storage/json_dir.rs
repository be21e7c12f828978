//! JSON directory storage
//!
//! Layout under the data directory:
//!
//! ```text
//! participants/<id>.json   one record per participant
//! settings.json            {"registration_open": true}
//! assignments.json         {"<santa>": "<child>", ...}
//! .lock                    held exclusively while the store is open
//! ```
//!
//! Files are written to a `.tmp` sibling and renamed into place.

use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::{Storage, StorageError, StorageResult};
use crate::{
    assignment::Assignment,
    participant::{Participant, ParticipantId},
};

const PARTICIPANTS_DIR: &str = "participants";
const SETTINGS_FILE: &str = "settings.json";
const ASSIGNMENTS_FILE: &str = "assignments.json";
const LOCK_FILE: &str = ".lock";

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    registration_open: bool,
}

/// Flat-file storage rooted at a data directory
#[derive(Debug)]
pub struct JsonDirStorage {
    root: PathBuf,
    // Released when dropped
    _lock: std::fs::File,
}

impl JsonDirStorage {
    /// Open (creating if needed) the store rooted at `root`.
    ///
    /// A fresh directory starts with `registration_open = open_on_init` and
    /// no assignment. Fails with [`StorageError::Locked`] if another process
    /// holds the directory.
    pub async fn open(root: &Path, open_on_init: bool) -> StorageResult<Self> {
        let participants = root.join(PARTICIPANTS_DIR);
        tokio::fs::create_dir_all(&participants)
            .await
            .map_err(|e| StorageError::io(&participants, &e))?;

        let lock_path = root.join(LOCK_FILE);
        let lock = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StorageError::io(&lock_path, &e))?;
        lock.try_lock_exclusive()
            .map_err(|e| StorageError::Locked(format!("{}: {e}", lock_path.display())))?;

        let storage = Self {
            root: root.to_path_buf(),
            _lock: lock,
        };

        if !storage.settings_path().exists() {
            storage.save_flag(open_on_init).await?;
        }
        if !storage.assignments_path().exists() {
            storage.save_mapping(&Assignment::default()).await?;
        }

        Ok(storage)
    }

    /// Root directory of this store
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn participant_path(&self, id: &ParticipantId) -> PathBuf {
        self.root
            .join(PARTICIPANTS_DIR)
            .join(format!("{}.json", id.as_str()))
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    fn assignments_path(&self) -> PathBuf {
        self.root.join(ASSIGNMENTS_FILE)
    }
}

/// Write `value` as pretty JSON via a temporary file and rename
async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> StorageResult<()> {
    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| StorageError::malformed(path.display().to_string(), e))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|e| StorageError::io(&tmp, &e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StorageError::io(path, &e))
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> StorageResult<T> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|e| StorageError::io(path, &e))?;
    serde_json::from_slice(&body)
        .map_err(|e| StorageError::malformed(path.display().to_string(), e))
}

#[async_trait::async_trait]
impl Storage for JsonDirStorage {
    async fn load_all(&self) -> StorageResult<Vec<Participant>> {
        let dir = self.root.join(PARTICIPANTS_DIR);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, &e))?;

        let mut participants = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&dir, &e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let participant: Participant = read_json(&path).await?;
            let stem = path.file_stem().and_then(|s| s.to_str());
            if stem != Some(participant.id.as_str()) {
                return Err(StorageError::malformed(
                    path.display().to_string(),
                    format!("file name does not match id '{}'", participant.id),
                ));
            }
            participants.push(participant);
        }

        participants.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(participants)
    }

    async fn save(&self, participant: &Participant) -> StorageResult<()> {
        write_json(&self.participant_path(&participant.id), participant).await
    }

    async fn delete(&self, id: &ParticipantId) -> StorageResult<()> {
        let path = self.participant_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(&path, &e)),
        }
    }

    async fn load_flag(&self) -> StorageResult<bool> {
        read_json::<Settings>(&self.settings_path())
            .await
            .map(|settings| settings.registration_open)
    }

    async fn save_flag(&self, open: bool) -> StorageResult<()> {
        write_json(
            &self.settings_path(),
            &Settings {
                registration_open: open,
            },
        )
        .await
    }

    async fn load_mapping(&self) -> StorageResult<Assignment> {
        read_json(&self.assignments_path()).await
    }

    async fn save_mapping(&self, mapping: &Assignment) -> StorageResult<()> {
        write_json(&self.assignments_path(), mapping).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_fresh_directory_is_initialised() {
        let dir = TempDir::new().unwrap();
        let storage = JsonDirStorage::open(dir.path(), true).await.unwrap();

        assert!(storage.load_flag().await.unwrap());
        assert!(storage.load_mapping().await.unwrap().is_empty());
        assert!(storage.load_all().await.unwrap().is_empty());
        assert!(dir.path().join(SETTINGS_FILE).exists());
    }

    #[tokio::test]
    async fn test_second_open_is_locked() {
        let dir = TempDir::new().unwrap();
        let _first = JsonDirStorage::open(dir.path(), true).await.unwrap();

        let second = JsonDirStorage::open(dir.path(), true).await;
        assert!(matches!(second, Err(StorageError::Locked(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let storage = JsonDirStorage::open(dir.path(), true).await.unwrap();
        let ghost = ParticipantId::parse("ghost").unwrap();
        assert!(storage.delete(&ghost).await.is_ok());
    }
}
