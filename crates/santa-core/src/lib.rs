//! # Santa Core
//!
//! Registry and assignment engine for a Secret Santa gift exchange.
//!
//! ## Laws (Compiler Enforced)
//!
//! - No `unwrap()` - returns `Result` instead
//! - No `expect()` - returns `Result` instead
//! - No `panic!()` - returns `Result` instead
//! - No `unsafe` - safe Rust only
//!
//! ## Layout
//!
//! - [`participant`]: participant records and the per-user input mode
//! - [`registry`]: gated create/update/delete of participants
//! - [`derange`]: rejection-sampling derangement
//! - [`assignment`]: compute-once santa to child mapping
//! - [`exchange`]: the orchestrator every transport talks to
//! - [`storage`]: persistence backends (memory, JSON directory, `SQLite`)
//! - [`config`]: layered TOML + environment configuration

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod assignment;
pub mod config;
pub mod derange;
mod error;
pub mod exchange;
mod messages;
pub mod participant;
pub mod registry;
pub mod storage;

pub use assignment::{Assignment, AssignmentStore};
pub use config::{Config, StorageBackend};
pub use derange::{derange, Derangement};
pub use error::{Error, ErrorKind, Result};
pub use exchange::{Reply, SecretSanta};
pub use participant::{InputMode, Participant, ParticipantId};
pub use registry::{MissingAddressReport, Registry};
pub use storage::{open_storage, JsonDirStorage, MemoryStorage, SqliteStorage, Storage, StorageError};
