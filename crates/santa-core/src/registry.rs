//! Participant registry
//!
//! Owns the participant records and the registration gate. Every mutating
//! operation re-checks the gate and the participant's existence itself; the
//! gate can flip between the moment a command is queued and the moment it
//! runs.
//!
//! Persistence failures after startup are logged and do not undo the
//! in-memory change.

use std::sync::Arc;

use crate::{
    participant::{InputMode, Participant, ParticipantId},
    storage::Storage,
    Error, Result,
};

/// Address completeness of the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingAddressReport {
    /// Registered participants
    pub total: usize,
    /// Participants with an address on file
    pub eligible: usize,
    /// Participants still missing an address, in registration order
    pub missing: Vec<ParticipantId>,
}

/// Registered participants and the registration gate
pub struct Registry {
    participants: Vec<Participant>,
    open: bool,
    storage: Arc<dyn Storage>,
}

impl Registry {
    /// Load participants and the gate flag. Called once at startup; any
    /// failure here is fatal to the caller.
    pub async fn load(storage: Arc<dyn Storage>) -> Result<Self> {
        let participants = storage.load_all().await?;
        let open = storage.load_flag().await?;
        tracing::info!(participants = participants.len(), open, "registry loaded");
        Ok(Self {
            participants,
            open,
            storage,
        })
    }

    /// Whether registration is open
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Register `id` with an empty address and message.
    pub async fn add(&mut self, id: &ParticipantId) -> Result<Participant> {
        self.ensure_open()?;
        if self.is_registered(id) {
            return Err(Error::AlreadyRegistered(id.clone()));
        }

        let participant = Participant::new(id.clone());
        self.participants.push(participant.clone());
        self.persist(&participant).await;
        tracing::info!(participant = %id, "registered");
        Ok(participant)
    }

    /// Overwrite the address of `id`.
    pub async fn set_address(&mut self, id: &ParticipantId, text: &str) -> Result<Participant> {
        self.update(id, |p| p.address = text.to_string()).await
    }

    /// Overwrite the message of `id`.
    pub async fn set_message(&mut self, id: &ParticipantId, text: &str) -> Result<Participant> {
        self.update(id, |p| p.message = text.to_string()).await
    }

    /// Remove `id` and its stored record.
    pub async fn remove(&mut self, id: &ParticipantId) -> Result<Participant> {
        self.ensure_open()?;
        let index = self
            .position(id)
            .ok_or_else(|| Error::NotRegistered(id.clone()))?;

        let removed = self.participants.remove(index);
        if let Err(e) = self.storage.delete(id).await {
            tracing::error!(participant = %id, error = %e, "failed to delete stored record");
        }
        tracing::info!(participant = %id, "unregistered");
        Ok(removed)
    }

    /// Set the pending input mode of `id`. Held in memory only.
    pub fn set_mode(&mut self, id: &ParticipantId, mode: InputMode) -> Result<()> {
        self.ensure_open()?;
        let participant = self
            .find_mut(id)
            .ok_or_else(|| Error::NotRegistered(id.clone()))?;
        participant.input_mode = mode;
        Ok(())
    }

    /// Pending input mode of `id`; `None` when not registered.
    #[must_use]
    pub fn mode(&self, id: &ParticipantId) -> InputMode {
        self.get(id).map_or(InputMode::None, |p| p.input_mode)
    }

    /// Clear the pending input mode of `id`, if registered.
    pub fn reset_mode(&mut self, id: &ParticipantId) {
        if let Some(participant) = self.find_mut(id) {
            participant.input_mode = InputMode::None;
        }
    }

    /// Flip the gate, persist it and return the new value.
    pub async fn toggle_open(&mut self) -> bool {
        let open = !self.open;
        self.set_open(open).await;
        open
    }

    /// Set the gate and persist it.
    pub async fn set_open(&mut self, open: bool) {
        self.open = open;
        if let Err(e) = self.storage.save_flag(open).await {
            tracing::error!(open, error = %e, "failed to persist registration flag");
        }
        tracing::info!(open, "registration gate set");
    }

    /// Registered ids in registration order
    #[must_use]
    pub fn list_ids(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }

    /// Registered participants in registration order
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    #[must_use]
    pub fn is_registered(&self, id: &ParticipantId) -> bool {
        self.position(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Count participants with and without an address
    #[must_use]
    pub fn count_missing_address(&self) -> MissingAddressReport {
        let missing: Vec<ParticipantId> = self
            .participants
            .iter()
            .filter(|p| !p.has_address())
            .map(|p| p.id.clone())
            .collect();
        MissingAddressReport {
            total: self.participants.len(),
            eligible: self.participants.len() - missing.len(),
            missing,
        }
    }

    async fn update<F>(&mut self, id: &ParticipantId, apply: F) -> Result<Participant>
    where
        F: FnOnce(&mut Participant) + Send,
    {
        self.ensure_open()?;
        let participant = self
            .find_mut(id)
            .ok_or_else(|| Error::NotRegistered(id.clone()))?;
        apply(participant);
        let updated = participant.clone();
        self.persist(&updated).await;
        tracing::info!(participant = %id, "updated");
        Ok(updated)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::RegistrationClosed)
        }
    }

    async fn persist(&self, participant: &Participant) {
        if let Err(e) = self.storage.save(participant).await {
            tracing::error!(participant = %participant.id, error = %e, "failed to persist record");
        }
    }

    fn position(&self, id: &ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| &p.id == id)
    }

    fn find_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }
}
