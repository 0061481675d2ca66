//! Transport layer: one physical WebSocket presented as a named-event bus.
//!
//! - `connection`: the multiplexed connection handle (send, listen, lifecycle).
//! - `ws`: the driver task that owns the socket.
//! - `codec`: WebSocket message -> text frame.
//! - `reconnect`: retry policy that replaces dead connections.

pub mod codec;
pub mod connection;
pub mod reconnect;
pub mod ws;

use std::time::Duration;

use serde_json::Value;

use otsock_core::error::Result;
use otsock_core::protocol::Dialect;

use crate::config::ClientConfig;
use crate::dispatch::Listener;

pub use connection::MuxConnection;
pub use reconnect::{Backoff, ReconnectingConnection};

/// Lifecycle of one physical connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// What the protocol adapter needs from a connection.
pub trait Channel: Send + Sync {
    /// Register a listener for a named event.
    fn subscribe(&self, event: &str, listener: Listener);
    /// Send `data` under `event` using the connection's dialect.
    fn send(&self, event: &str, data: Value) -> Result<()>;
    /// Outbound dialect; the adapter picks event names from it.
    fn dialect(&self) -> Dialect;
    fn state(&self) -> ConnectionState;
    fn close(&self);
}

/// Per-connection knobs, taken from the client config.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub dialect: Dialect,
    pub outbound_queue: usize,
    pub keepalive: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Classic,
            outbound_queue: 256,
            keepalive: Some(Duration::from_millis(20000)),
        }
    }
}

impl From<&ClientConfig> for ConnectionOptions {
    fn from(cfg: &ClientConfig) -> Self {
        Self {
            dialect: cfg.protocol.dialect,
            outbound_queue: cfg.client.outbound_queue,
            keepalive: match cfg.client.keepalive_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}
