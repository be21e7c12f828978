//! Santa - Secret Santa chat bot
//!
//! Command dispatch and console transports on top of `santa-core`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod bot;
pub mod cli;

pub use bot::{Bot, Command};
