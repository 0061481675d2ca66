//! otsock client library entry.
//!
//! This crate turns one WebSocket into the named-event bus an OT editor
//! needs: the transport and reconnect policy, the listener registry, the
//! protocol adapter that speaks the wire vocabulary, the application context
//! holding roster and document, plus config loading and metrics. It is
//! consumed by the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod adapter;
pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod transport;
