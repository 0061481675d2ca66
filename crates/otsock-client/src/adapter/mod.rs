//! Protocol adapter: the only place that knows wire event names.
//!
//! Inbound, it subscribes to every alias of every event on the channel and
//! turns each frame into `SessionEvent`s, delivered first to application
//! observers and then to the active `EditorCallbacks` table. Outbound, it
//! shapes OT engine actions into wire payloads under the channel's dialect.
//!
//! The adapter keeps no protocol state.

mod callbacks;
mod translate;

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use otsock_core::error::{OtSockError, Result};
use otsock_core::protocol::payload::{JoinRequest, LocalOperation};
use otsock_core::protocol::WireEvent;

use crate::transport::Channel;

pub use callbacks::EditorCallbacks;
pub use translate::{translate, SessionEvent};

/// Application observer of translated events.
pub type Observer = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct Targets {
    callbacks: RwLock<Option<Arc<dyn EditorCallbacks>>>,
    observers: RwLock<Vec<Observer>>,
}

impl Targets {
    fn deliver(&self, event: &SessionEvent) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer(event);
        }

        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(cb) = callbacks {
            callbacks::invoke(cb.as_ref(), event);
        }
    }
}

#[derive(Clone)]
pub struct ProtocolAdapter {
    channel: Arc<dyn Channel>,
    targets: Arc<Targets>,
}

impl ProtocolAdapter {
    /// Subscribe to every inbound event the protocol defines.
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        let targets = Arc::new(Targets::default());

        for event in WireEvent::ALL {
            for &name in event.aliases() {
                let targets = Arc::clone(&targets);
                channel.subscribe(
                    name,
                    Arc::new(move |data: &Value, _raw: Option<&str>| {
                        for translated in translate(event, data) {
                            targets.deliver(&translated);
                        }
                    }),
                );
            }
        }

        Self { channel, targets }
    }

    /// Install the OT engine's callback table, replacing any previous one.
    pub fn register_callbacks(&self, callbacks: Arc<dyn EditorCallbacks>) {
        let mut slot = self
            .targets
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(callbacks);
    }

    /// Add an application observer. Observers run before the callback table.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.targets
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(observer));
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    /// Send a local operation as `[revision, operation, selection]`.
    pub fn send_operation(&self, revision: u64, operation: Value, selection: Value) -> Result<()> {
        let data = serde_json::to_value(LocalOperation(revision, operation, selection))
            .map_err(|e| OtSockError::Internal(format!("operation encode failed: {e}")))?;
        self.channel
            .send(self.channel.dialect().name(WireEvent::Operation), data)
    }

    pub fn send_selection(&self, selection: Value) -> Result<()> {
        self.channel
            .send(self.channel.dialect().name(WireEvent::Selection), selection)
    }

    pub fn send_join(&self, username: &str) -> Result<()> {
        send_join(self.channel.as_ref(), username)
    }
}

/// Ask the server to admit this client under `username`.
pub fn send_join(channel: &dyn Channel, username: &str) -> Result<()> {
    let data = serde_json::to_value(JoinRequest {
        username: username.to_owned(),
    })
    .map_err(|e| OtSockError::Internal(format!("join encode failed: {e}")))?;
    channel.send(channel.dialect().name(WireEvent::Join), data)
}
