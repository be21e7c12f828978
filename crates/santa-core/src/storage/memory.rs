//! In-memory storage

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use super::{Storage, StorageError, StorageResult};
use crate::{
    assignment::Assignment,
    participant::{InputMode, Participant, ParticipantId},
};

#[derive(Debug, Default)]
struct State {
    participants: Vec<Participant>,
    open: bool,
    mapping: Assignment,
}

/// Process-local storage
///
/// Writes can be made to fail with [`MemoryStorage::fail_writes`] to exercise
/// the error path of callers.
#[derive(Debug)]
pub struct MemoryStorage {
    state: Mutex<State>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    /// Create an empty store with registration open
    #[must_use]
    pub fn new() -> Self {
        Self::with_flag(true)
    }

    /// Create an empty store with the given registration flag
    #[must_use]
    pub fn with_flag(open: bool) -> Self {
        Self {
            state: Mutex::new(State {
                open,
                ..State::default()
            }),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Io {
                path: "memory".to_string(),
                message: "writes disabled".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn load_all(&self) -> StorageResult<Vec<Participant>> {
        Ok(self.state.lock().await.participants.clone())
    }

    async fn save(&self, participant: &Participant) -> StorageResult<()> {
        self.check_writable()?;
        // Input mode lives in the registry only
        let stored = Participant {
            input_mode: InputMode::None,
            ..participant.clone()
        };
        let mut state = self.state.lock().await;
        match state
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
        {
            Some(existing) => *existing = stored,
            None => state.participants.push(stored),
        }
        Ok(())
    }

    async fn delete(&self, id: &ParticipantId) -> StorageResult<()> {
        self.check_writable()?;
        self.state.lock().await.participants.retain(|p| &p.id != id);
        Ok(())
    }

    async fn load_flag(&self) -> StorageResult<bool> {
        Ok(self.state.lock().await.open)
    }

    async fn save_flag(&self, open: bool) -> StorageResult<()> {
        self.check_writable()?;
        self.state.lock().await.open = open;
        Ok(())
    }

    async fn load_mapping(&self) -> StorageResult<Assignment> {
        Ok(self.state.lock().await.mapping.clone())
    }

    async fn save_mapping(&self, mapping: &Assignment) -> StorageResult<()> {
        self.check_writable()?;
        self.state.lock().await.mapping = mapping.clone();
        Ok(())
    }
}
