//! Derangement engine
//!
//! Rejection sampling: shuffle a copy of the ids, pair it position-wise with
//! the original order, and reshuffle while any position pairs an id with
//! itself. The result is a derangement but not a uniform draw over all
//! derangements; the retry behaviour for a given seed is part of the
//! contract, so the loop has no retry cap.

use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};

use crate::{assignment::Assignment, participant::ParticipantId, Error, Result};

/// Result of a derangement run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derangement {
    /// Santa to child pairs
    pub mapping: Assignment,
    /// Number of shuffles performed (at least 1)
    pub attempts: u64,
}

/// Produce a random bijection over `ids` with no fixed point.
///
/// # Errors
///
/// - [`Error::InsufficientParticipants`] when fewer than 2 ids are given
/// - [`Error::InvalidId`] when `ids` contains duplicates
pub fn derange<R: Rng + ?Sized>(ids: &[ParticipantId], rng: &mut R) -> Result<Derangement> {
    if ids.len() < 2 {
        return Err(Error::InsufficientParticipants { found: ids.len() });
    }

    let mut seen = HashSet::with_capacity(ids.len());
    if let Some(dup) = ids.iter().find(|id| !seen.insert(*id)) {
        return Err(Error::InvalidId(format!("'{dup}' appears more than once")));
    }

    let mut shuffled = ids.to_vec();
    let mut attempts: u64 = 0;
    loop {
        shuffled.shuffle(rng);
        attempts += 1;
        if ids.iter().zip(&shuffled).all(|(santa, child)| santa != child) {
            break;
        }
    }
    tracing::debug!(participants = ids.len(), attempts, "derangement found");

    let mapping = ids.iter().cloned().zip(shuffled).collect();
    Ok(Derangement { mapping, attempts })
}
