//! otsock core: transport-agnostic protocol primitives for the collaborative
//! editor link.
//!
//! This crate defines the wire envelope, the event vocabulary with its
//! historical dialects, typed payloads, the presence roster, and the error
//! surface shared by the client runtime. It carries no socket or async runtime
//! dependency so the same rules apply in tests, tools, and the live client.
//!
//! # Guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input from the wire surfaces as `OtSockError`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod presence;
pub mod protocol;

/// Error surface shared by every crate in the workspace.
pub use error::{ErrorCode, OtSockError, Result};
