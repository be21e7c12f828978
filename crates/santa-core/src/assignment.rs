//! Assignment mapping and its compute-once store

use std::{collections::BTreeMap, sync::Arc};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{derange::derange, participant::ParticipantId, storage::Storage, Error, Result};

/// Santa to child mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment(BTreeMap<ParticipantId, ParticipantId>);

impl Assignment {
    /// Child assigned to `santa`
    #[must_use]
    pub fn get(&self, santa: &ParticipantId) -> Option<&ParticipantId> {
        self.0.get(santa)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate pairs in santa order
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &ParticipantId)> {
        self.0.iter()
    }

    /// Every id appears once as a santa and once as a child, never paired
    /// with itself.
    #[must_use]
    pub fn is_derangement(&self) -> bool {
        let mut children: Vec<&ParticipantId> = self.0.values().collect();
        children.sort();
        let santas: Vec<&ParticipantId> = self.0.keys().collect();
        children == santas && self.0.iter().all(|(santa, child)| santa != child)
    }
}

impl FromIterator<(ParticipantId, ParticipantId)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, ParticipantId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Owns the persisted mapping; computes it at most once
pub struct AssignmentStore {
    mapping: Assignment,
    storage: Arc<dyn Storage>,
}

impl AssignmentStore {
    /// Load the stored mapping. Called once at startup.
    pub async fn load(storage: Arc<dyn Storage>) -> Result<Self> {
        let mapping = storage.load_mapping().await?;
        tracing::info!(pairs = mapping.len(), "assignment loaded");
        Ok(Self { mapping, storage })
    }

    #[must_use]
    pub fn has_assignment(&self) -> bool {
        !self.mapping.is_empty()
    }

    /// Derange `eligible`, persist and return the mapping.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyAssigned`] if a mapping exists (it is left unchanged)
    /// - [`Error::InsufficientParticipants`] for fewer than 2 eligible ids
    pub async fn compute_and_persist<R: Rng + ?Sized + Send>(
        &mut self,
        eligible: &[ParticipantId],
        rng: &mut R,
    ) -> Result<Assignment> {
        if self.has_assignment() {
            return Err(Error::AlreadyAssigned);
        }

        let derangement = derange(eligible, rng)?;
        self.mapping = derangement.mapping;
        tracing::info!(
            pairs = self.mapping.len(),
            attempts = derangement.attempts,
            "assignment computed"
        );

        if let Err(e) = self.storage.save_mapping(&self.mapping).await {
            tracing::error!(error = %e, "failed to persist assignment; keeping it in memory");
        }
        Ok(self.mapping.clone())
    }

    /// Child assigned to `santa`, if any
    #[must_use]
    pub fn lookup(&self, santa: &ParticipantId) -> Option<&ParticipantId> {
        self.mapping.get(santa)
    }

    /// Read-only view of the mapping
    #[must_use]
    pub const fn mapping(&self) -> &Assignment {
        &self.mapping
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::storage::MemoryStorage;

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names
            .iter()
            .map(|n| ParticipantId::parse(n).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_compute_once() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = AssignmentStore::load(storage.clone()).await.unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let first = store
            .compute_and_persist(&ids(&["a1", "b1", "c1"]), &mut rng)
            .await
            .unwrap();
        assert!(first.is_derangement());
        assert_eq!(storage.load_mapping().await.unwrap(), first);

        let second = store
            .compute_and_persist(&ids(&["x1", "y1"]), &mut rng)
            .await;
        assert_eq!(second, Err(Error::AlreadyAssigned));
        assert_eq!(store.mapping(), &first);
    }

    #[tokio::test]
    async fn test_lookup_missing_santa() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = AssignmentStore::load(storage).await.unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let people = ids(&["a1", "b1"]);
        store.compute_and_persist(&people, &mut rng).await.unwrap();

        assert_eq!(store.lookup(&people[0]), Some(&people[1]));
        assert_eq!(store.lookup(&ParticipantId::parse("zz").unwrap()), None);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_mapping() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = AssignmentStore::load(storage.clone()).await.unwrap();
        storage.fail_writes(true);

        let mut rng = StdRng::seed_from_u64(9);
        let result = store
            .compute_and_persist(&ids(&["a1", "b1"]), &mut rng)
            .await;
        assert!(result.is_ok());
        assert!(store.has_assignment());
        assert!(storage.load_mapping().await.unwrap().is_empty());
    }

    #[test]
    fn test_is_derangement_detects_fixed_point() {
        let p = ids(&["a1", "b1"]);
        let bad: Assignment = vec![(p[0].clone(), p[0].clone()), (p[1].clone(), p[1].clone())]
            .into_iter()
            .collect();
        assert!(!bad.is_derangement());
    }
}
