//! Reconnect supervisor.
//!
//! A dead connection is never revived. The supervisor waits out a backoff,
//! builds a brand-new `MuxConnection` on the same `EventBus` (so every
//! registered listener stays attached), and that connection announces the
//! new epoch with `reconnect` right after `open`.
//!
//! While no connection is open, `send` reports `NotConnected`: operations
//! from the previous epoch are never replayed into the next one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::Value;
use tracing::Instrument;

use otsock_core::error::Result;
use otsock_core::protocol::Dialect;

use super::{Channel, ConnectionOptions, ConnectionState, MuxConnection};
use crate::config::ReconnectSection;
use crate::dispatch::{EventBus, Listener};
use crate::obs::ClientMetrics;

/// Exponential backoff: `initial * 2^(attempt-1)`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }

    /// Delay before attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial.saturating_mul(factor).min(self.max)
    }
}

impl From<&ReconnectSection> for Backoff {
    fn from(cfg: &ReconnectSection) -> Self {
        Self::new(
            Duration::from_millis(cfg.initial_backoff_ms),
            Duration::from_millis(cfg.max_backoff_ms),
        )
    }
}

/// Connection handle that survives transport loss.
#[derive(Clone)]
pub struct ReconnectingConnection {
    inner: Arc<Supervised>,
}

struct Supervised {
    url: String,
    opts: ConnectionOptions,
    backoff: Backoff,
    enabled: bool,
    max_attempts: u32,
    bus: Arc<EventBus>,
    metrics: Arc<ClientMetrics>,
    current: RwLock<MuxConnection>,
    stopped: AtomicBool,
}

impl ReconnectingConnection {
    /// Open the first connection and start supervising it.
    /// Must be called from inside a tokio runtime.
    pub fn connect(
        url: impl Into<String>,
        opts: ConnectionOptions,
        policy: &ReconnectSection,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        let url = url.into();
        let bus = Arc::new(EventBus::new());
        let first = MuxConnection::connect(url.clone(), &opts, Arc::clone(&bus), Arc::clone(&metrics));

        let inner = Arc::new(Supervised {
            url: url.clone(),
            opts,
            backoff: Backoff::from(policy),
            enabled: policy.enabled,
            max_attempts: policy.max_attempts,
            bus,
            metrics,
            current: RwLock::new(first.clone()),
            stopped: AtomicBool::new(false),
        });

        let span = tracing::info_span!("reconnect", %url);
        tokio::spawn(supervise(Arc::clone(&inner), first).instrument(span));

        Self { inner }
    }

    /// The connection currently in charge (possibly already closed).
    pub fn current(&self) -> MuxConnection {
        match self.inner.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(&Value, Option<&str>) + Send + Sync + 'static,
    {
        self.inner.bus.on(event, listener);
    }

    pub fn send(&self, event: &str, data: Value) -> Result<()> {
        self.current().send(event, data)
    }

    pub fn state(&self) -> ConnectionState {
        self.current().state()
    }

    /// Stop reconnecting and close the current connection.
    pub fn close(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.current().close();
    }
}

impl Supervised {
    fn replace(&self, next: MuxConnection) {
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

async fn supervise(sup: Arc<Supervised>, mut conn: MuxConnection) {
    let mut attempt: u32 = 0;

    loop {
        let mut state = conn.subscribe_state();
        let settled = state
            .wait_for(|s| *s != ConnectionState::Connecting)
            .await
            .map(|s| *s == ConnectionState::Open);
        let Ok(opened) = settled else { break };
        if opened {
            attempt = 0;
        }
        let ended = state
            .wait_for(|s| *s == ConnectionState::Closed)
            .await
            .map(|_| ());
        if ended.is_err() {
            break;
        }

        if sup.stopped() || !sup.enabled {
            break;
        }

        attempt = attempt.saturating_add(1);
        if sup.max_attempts != 0 && attempt > sup.max_attempts {
            tracing::error!(attempts = sup.max_attempts, "giving up on reconnecting");
            break;
        }

        let delay = sup.backoff.delay(attempt);
        tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "connection closed; reconnecting");
        tokio::time::sleep(delay).await;
        if sup.stopped() {
            break;
        }

        // Install before starting, so anything reacting to `reconnect`
        // already sends through the new connection.
        let (next, outbound_rx) = MuxConnection::detached(
            sup.url.clone(),
            &sup.opts,
            Arc::clone(&sup.bus),
            Arc::clone(&sup.metrics),
            conn.epoch() + 1,
        );
        sup.replace(next.clone());
        if sup.stopped() {
            next.close();
            break;
        }
        next.start(outbound_rx, sup.opts.keepalive);
        conn = next;
    }
}

impl Channel for ReconnectingConnection {
    fn subscribe(&self, event: &str, listener: Listener) {
        self.inner.bus.subscribe(event, listener);
    }

    fn send(&self, event: &str, data: Value) -> Result<()> {
        ReconnectingConnection::send(self, event, data)
    }

    fn dialect(&self) -> Dialect {
        self.inner.opts.dialect
    }

    fn state(&self) -> ConnectionState {
        ReconnectingConnection::state(self)
    }

    fn close(&self) {
        ReconnectingConnection::close(self)
    }
}
