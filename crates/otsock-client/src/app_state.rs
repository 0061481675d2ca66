//! Application context.
//!
//! Built once at startup and passed by reference: owns the channel, the
//! protocol adapter, the presence roster, and the local document buffer.
//! Everything it tracks is fed by adapter events; nothing is global.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use otsock_core::error::Result;
use otsock_core::presence::{Member, Roster};

use crate::adapter::{self, ProtocolAdapter, SessionEvent};
use crate::config::ClientConfig;
use crate::obs::ClientMetrics;
use crate::transport::{Channel, ConnectionOptions, ConnectionState, ReconnectingConnection};

/// Local copy of the document as last delivered by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentState {
    pub text: String,
    pub revision: u64,
}

#[derive(Default)]
struct Shared {
    roster: Mutex<Roster>,
    document: Mutex<DocumentState>,
    own_id: Mutex<Option<String>>,
    username: Mutex<Option<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn apply(&self, event: &SessionEvent, channel: &Weak<dyn Channel>) {
        match event {
            SessionEvent::Snapshot(doc) => {
                let seeded = lock(&self.roster).apply_initial_roster(doc.clients.iter().cloned());
                *lock(&self.document) = DocumentState {
                    text: doc.document.clone(),
                    revision: doc.revision,
                };
                tracing::debug!(revision = doc.revision, seeded, "document snapshot applied");
            }
            SessionEvent::Joined { client_id, username } => {
                let mut roster = lock(&self.roster);
                roster.apply_join(client_id.as_str());
                if let Some(name) = username {
                    roster.set_name(client_id, name.as_str());
                }
            }
            SessionEvent::Left { client_id } => {
                lock(&self.roster).apply_quit(client_id);
            }
            SessionEvent::AssignedId { client_id } => {
                *lock(&self.own_id) = Some(client_id.clone());
            }
            SessionEvent::Reconnect => {
                lock(&self.roster).reset();
                *lock(&self.own_id) = None;
                self.rejoin(channel);
            }
            SessionEvent::Ack | SessionEvent::Operation(_) | SessionEvent::Selection { .. } => {}
        }
    }

    /// A new epoch starts anonymous: repeat the join if we had one.
    fn rejoin(&self, channel: &Weak<dyn Channel>) {
        let username = lock(&self.username).clone();
        let (Some(name), Some(channel)) = (username, channel.upgrade()) else {
            return;
        };
        if let Err(e) = adapter::send_join(channel.as_ref(), &name) {
            tracing::warn!(error = %e, "rejoin after reconnect failed");
        }
    }
}

pub struct AppContext {
    channel: Arc<dyn Channel>,
    adapter: ProtocolAdapter,
    shared: Arc<Shared>,
    metrics: Arc<ClientMetrics>,
}

impl AppContext {
    /// Connect according to `cfg` (with the reconnect policy) and wire
    /// everything up. Must be called from inside a tokio runtime.
    pub fn connect(cfg: &ClientConfig) -> Result<Self> {
        let url = cfg.ws_url()?;
        let metrics = Arc::new(ClientMetrics::new());
        let conn = ReconnectingConnection::connect(
            url,
            ConnectionOptions::from(cfg),
            &cfg.reconnect,
            Arc::clone(&metrics),
        );
        Ok(Self::attach(Arc::new(conn), metrics))
    }

    /// Wire an existing channel.
    pub fn attach(channel: Arc<dyn Channel>, metrics: Arc<ClientMetrics>) -> Self {
        let adapter = ProtocolAdapter::new(Arc::clone(&channel));
        let shared = Arc::new(Shared::default());

        let observer_state = Arc::clone(&shared);
        let weak_channel = Arc::downgrade(&channel);
        adapter.subscribe(move |event| observer_state.apply(event, &weak_channel));

        Self {
            channel,
            adapter,
            shared,
            metrics,
        }
    }

    pub fn adapter(&self) -> &ProtocolAdapter {
        &self.adapter
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Join the session; the name is remembered and re-sent after reconnects.
    pub fn join(&self, username: &str) -> Result<()> {
        *lock(&self.shared.username) = Some(username.to_owned());
        self.adapter.send_join(username)
    }

    /// Client ids in roster order.
    pub fn roster(&self) -> Vec<String> {
        lock(&self.shared.roster)
            .current_members()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub fn members(&self) -> Vec<Member> {
        lock(&self.shared.roster).members().to_vec()
    }

    pub fn document(&self) -> DocumentState {
        lock(&self.shared.document).clone()
    }

    pub fn own_client_id(&self) -> Option<String> {
        lock(&self.shared.own_id).clone()
    }

    pub fn close(&self) {
        self.channel.close();
    }
}
