//! Listener registry.
//!
//! The registry is a standalone object handed to each connection, so the same
//! registrations keep working when a reconnect replaces the connection.

pub mod bus;

pub use bus::{EventBus, Listener};
