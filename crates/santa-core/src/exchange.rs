//! Secret Santa orchestrator
//!
//! [`SecretSanta`] is the single entry point transports talk to. Registry,
//! assignment store and RNG sit behind one async mutex, so the gate check,
//! the mutation and the storage write of a command are one step relative to
//! every other command.
//!
//! Every operation answers with a [`Reply`]: text for the user plus an
//! optional [`ErrorKind`] for callers that need to branch on the outcome.

use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::Mutex;

use crate::{
    assignment::{Assignment, AssignmentStore},
    config::Config,
    messages,
    participant::{single_line, InputMode, ParticipantId},
    registry::Registry,
    storage::Storage,
    Error, ErrorKind, Result,
};

/// Outcome of a user-facing operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text to send back to the user
    pub text: String,
    /// Set when the operation was rejected
    pub error: Option<ErrorKind>,
}

impl Reply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    fn failed(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: Some(kind),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

struct Inner {
    registry: Registry,
    assignments: AssignmentStore,
    rng: StdRng,
}

/// Registry + assignment workflow behind a single lock
pub struct SecretSanta {
    inner: Mutex<Inner>,
    assignment_date: Option<String>,
}

impl SecretSanta {
    /// Load state from `storage` using the RNG seed and texts from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the stored registry, flag or mapping cannot be loaded
    pub async fn open(storage: Arc<dyn Storage>, config: &Config) -> Result<Self> {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::with_rng(storage, rng, config.assignment_date.clone()).await
    }

    /// Load state from `storage` with an explicit RNG.
    ///
    /// # Errors
    ///
    /// Returns error if the stored registry, flag or mapping cannot be loaded
    pub async fn with_rng(
        storage: Arc<dyn Storage>,
        rng: StdRng,
        assignment_date: Option<String>,
    ) -> Result<Self> {
        let registry = Registry::load(Arc::clone(&storage)).await?;
        let assignments = AssignmentStore::load(storage).await?;
        Ok(Self {
            inner: Mutex::new(Inner {
                registry,
                assignments,
                rng,
            }),
            assignment_date,
        })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // REGISTRY OPERATIONS
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub async fn register(&self, id: &ParticipantId) -> Reply {
        let mut inner = self.inner.lock().await;
        match inner.registry.add(id).await {
            Ok(participant) => Reply::ok(messages::registered(&messages::own_info(Some(
                &participant,
            )))),
            Err(Error::AlreadyRegistered(_)) => Reply::failed(
                ErrorKind::AlreadyRegistered,
                messages::already_registered(&messages::own_info(inner.registry.get(id))),
            ),
            Err(e) => rejection(&e, id),
        }
    }

    pub async fn unregister(&self, id: &ParticipantId) -> Reply {
        let mut inner = self.inner.lock().await;
        match inner.registry.remove(id).await {
            Ok(_) => Reply::ok(messages::unregistered()),
            Err(e) => rejection(&e, id),
        }
    }

    pub async fn set_address(&self, id: &ParticipantId, text: &str) -> Reply {
        let mut inner = self.inner.lock().await;
        match inner.registry.set_address(id, text).await {
            Ok(p) => Reply::ok(messages::address_updated(&messages::own_info(Some(&p)))),
            Err(e) => rejection(&e, id),
        }
    }

    pub async fn set_message(&self, id: &ParticipantId, text: &str) -> Reply {
        let mut inner = self.inner.lock().await;
        match inner.registry.set_message(id, text).await {
            Ok(p) => Reply::ok(messages::message_updated(&messages::own_info(Some(&p)))),
            Err(e) => rejection(&e, id),
        }
    }

    /// Put `id` in `mode` so their next free text fills that field
    pub async fn begin_input(&self, id: &ParticipantId, mode: InputMode) -> Reply {
        let mut inner = self.inner.lock().await;
        match inner.registry.set_mode(id, mode) {
            Ok(()) => Reply::ok(messages::input_prompt(mode)),
            Err(e) => rejection(&e, id),
        }
    }

    /// Apply free text to the pending field of `id`.
    ///
    /// Returns `None` when no input is pending. The mode is cleared whether
    /// or not the write is accepted.
    pub async fn consume_input(&self, id: &ParticipantId, text: &str) -> Option<Reply> {
        let mut inner = self.inner.lock().await;
        let mode = inner.registry.mode(id);
        let value = single_line(text);
        let outcome = match mode {
            InputMode::None => return None,
            InputMode::AwaitingAddress => inner
                .registry
                .set_address(id, &value)
                .await
                .map(|p| messages::address_updated(&messages::own_info(Some(&p)))),
            InputMode::AwaitingMessage => inner
                .registry
                .set_message(id, &value)
                .await
                .map(|p| messages::message_updated(&messages::own_info(Some(&p)))),
        };
        inner.registry.reset_mode(id);
        Some(outcome.map_or_else(|e| rejection(&e, id), Reply::ok))
    }

    pub async fn reset_input(&self, id: &ParticipantId) {
        self.inner.lock().await.registry.reset_mode(id);
    }

    pub async fn input_mode(&self, id: &ParticipantId) -> InputMode {
        self.inner.lock().await.registry.mode(id)
    }

    pub async fn toggle_registrations(&self) -> Reply {
        let open = self.inner.lock().await.registry.toggle_open().await;
        Reply::ok(messages::registration_status(open))
    }

    pub async fn set_registrations(&self, open: bool) -> Reply {
        self.inner.lock().await.registry.set_open(open).await;
        Reply::ok(messages::registration_status(open))
    }

    pub async fn is_registration_open(&self) -> bool {
        self.inner.lock().await.registry.is_open()
    }

    pub async fn participant_list(&self) -> Reply {
        let ids = self.inner.lock().await.registry.list_ids();
        Reply::ok(messages::participant_list(&ids))
    }

    pub async fn participant_ids(&self) -> Vec<ParticipantId> {
        self.inner.lock().await.registry.list_ids()
    }

    pub async fn is_registered(&self, id: &ParticipantId) -> bool {
        self.inner.lock().await.registry.is_registered(id)
    }

    /// The caller's own details
    pub async fn my_info(&self, id: &ParticipantId) -> Reply {
        let inner = self.inner.lock().await;
        let participant = inner.registry.get(id);
        let text = messages::own_info(participant);
        if participant.is_some() {
            Reply::ok(text)
        } else {
            Reply::failed(ErrorKind::NotRegistered, text)
        }
    }

    /// How many participants have an address and who is still missing one
    pub async fn incomplete_report(&self) -> Reply {
        let report = self.inner.lock().await.registry.count_missing_address();
        Reply::ok(messages::incomplete_report(&report))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // ASSIGNMENT OPERATIONS
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Close registration and draw the assignment over participants with an
    /// address.
    pub async fn run_assignment(&self) -> Reply {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let total = inner.registry.len();
        if total < 2 {
            tracing::warn!(total, "assignment refused: not enough participants");
            return Reply::failed(
                ErrorKind::InsufficientParticipants,
                messages::NOT_ENOUGH_PARTICIPANTS,
            );
        }
        if inner.assignments.has_assignment() {
            tracing::warn!("assignment refused: already assigned");
            return Reply::failed(ErrorKind::AlreadyAssigned, messages::ALREADY_ASSIGNED);
        }

        let (eligible, excluded): (Vec<_>, Vec<_>) = inner
            .registry
            .participants()
            .iter()
            .partition(|p| p.has_address());
        let eligible: Vec<ParticipantId> = eligible.into_iter().map(|p| p.id.clone()).collect();
        let excluded: Vec<ParticipantId> = excluded.into_iter().map(|p| p.id.clone()).collect();

        inner.registry.set_open(false).await;
        let closed = messages::registration_status(false);

        match inner
            .assignments
            .compute_and_persist(&eligible, &mut inner.rng)
            .await
        {
            Ok(mapping) => {
                tracing::info!(
                    assigned = mapping.len(),
                    excluded = excluded.len(),
                    "assignment drawn"
                );
                let mut text = format!("{}{closed}", messages::ASSIGNMENT_DONE);
                if !excluded.is_empty() {
                    text.push_str(&messages::excluded(&excluded));
                }
                Reply::ok(text)
            }
            Err(Error::InsufficientParticipants { found }) => {
                tracing::warn!(eligible = found, "assignment refused: not enough addresses");
                Reply::failed(
                    ErrorKind::InsufficientParticipants,
                    format!("{}{closed}", messages::NOT_ENOUGH_PARTICIPANTS),
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "assignment failed");
                failure(&e)
            }
        }
    }

    /// The child assigned to `santa`, or why there is none
    pub async fn child_for(&self, santa: &ParticipantId) -> Reply {
        let inner = self.inner.lock().await;

        if !inner.assignments.has_assignment() {
            return Reply::ok(messages::waiting(
                inner.registry.get(santa),
                self.assignment_date.as_deref(),
            ));
        }

        let Some(child_id) = inner.assignments.lookup(santa) else {
            return Reply::failed(ErrorKind::NotRegistered, messages::NOT_ASSIGNED);
        };

        match inner.registry.get(child_id) {
            Some(child) if child.has_address() => Reply::ok(messages::child_profile(child)),
            _ => {
                let err = Error::InconsistentAssignment(child_id.clone());
                tracing::error!(santa = %santa, child = %child_id, error = %err, "assignment is inconsistent");
                Reply::failed(err.kind(), messages::inconsistent_child(child_id))
            }
        }
    }

    /// Copy of the current mapping
    pub async fn assignment_snapshot(&self) -> Assignment {
        self.inner.lock().await.assignments.mapping().clone()
    }
}

/// Turn a rejected registry operation into a reply
fn rejection(err: &Error, id: &ParticipantId) -> Reply {
    tracing::warn!(participant = %id, error = %err, "operation rejected");
    failure(err)
}

fn failure(err: &Error) -> Reply {
    let text = match err {
        Error::RegistrationClosed => messages::REGISTRATION_CLOSED.to_string(),
        Error::NotRegistered(_) => messages::NOT_REGISTERED.to_string(),
        Error::AlreadyAssigned => messages::ALREADY_ASSIGNED.to_string(),
        Error::InsufficientParticipants { .. } => messages::NOT_ENOUGH_PARTICIPANTS.to_string(),
        other => format!("Something went wrong: {other}\n"),
    };
    Reply::failed(err.kind(), text)
}
