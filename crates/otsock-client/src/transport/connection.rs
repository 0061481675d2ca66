//! Multiplexed connection: one physical socket, many named events.
//!
//! Outbound policy:
//! - `Connecting`: frames queue (bounded) and flush in order once open.
//! - `Open`: frames go straight to the socket writer.
//! - `Closed`: `send` fails with `NotConnected`. A closed connection never
//!   reopens; reconnecting means building a new one.
//!
//! Frames accepted but never written (the dial failed, or the socket died
//! with frames still queued) are counted as `dropped_frames{reason="unsent"}`
//! and logged at warn level before `close` fires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{watch, Notify};

use otsock_core::error::{OtSockError, Result};
use otsock_core::protocol::vocab::{self, CLOSE, OPEN, RECONNECT};
use otsock_core::protocol::{decode_envelope, encode_envelope, Dialect};

use super::{Channel, ConnectionOptions, ConnectionState};
use crate::dispatch::{EventBus, Listener};
use crate::obs::ClientMetrics;

/// Cloneable handle; all clones address the same physical connection.
#[derive(Clone)]
pub struct MuxConnection {
    inner: Arc<Inner>,
}

struct Inner {
    epoch: u64,
    url: String,
    dialect: Dialect,
    bus: Arc<EventBus>,
    metrics: Arc<ClientMetrics>,
    state: watch::Sender<ConnectionState>,
    outbound: mpsc::Sender<String>,
    shutdown: Notify,
}

impl MuxConnection {
    /// Start connecting to `url` and return at once.
    ///
    /// Completion is signalled by the `open` event; failure by `close`.
    /// Must be called from inside a tokio runtime.
    pub fn connect(
        url: impl Into<String>,
        opts: &ConnectionOptions,
        bus: Arc<EventBus>,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        let (conn, outbound_rx) = Self::detached(url, opts, bus, metrics, 0);
        conn.start(outbound_rx, opts.keepalive);
        conn
    }

    /// Spawn the socket driver for a detached connection.
    pub(crate) fn start(&self, outbound_rx: mpsc::Receiver<String>, keepalive: Option<Duration>) {
        tokio::spawn(super::ws::drive(self.clone(), outbound_rx, keepalive));
    }

    /// Build a connection with no socket behind it.
    ///
    /// The caller owns the returned receiver (encoded outbound frames) and
    /// drives the lifecycle through `mark_open`, `receive_frame` and
    /// `mark_closed`. The socket driver uses exactly these hooks.
    pub fn detached(
        url: impl Into<String>,
        opts: &ConnectionOptions,
        bus: Arc<EventBus>,
        metrics: Arc<ClientMetrics>,
        epoch: u64,
    ) -> (Self, mpsc::Receiver<String>) {
        let (outbound, outbound_rx) = mpsc::channel(opts.outbound_queue.max(1));
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let conn = Self {
            inner: Arc::new(Inner {
                epoch,
                url: url.into(),
                dialect: opts.dialect,
                bus,
                metrics,
                state,
                outbound,
                shutdown: Notify::new(),
            }),
        };
        (conn, outbound_rx)
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// 0 for the first connection, +1 for each replacement.
    pub fn epoch(&self) -> u64 {
        self.inner.epoch
    }

    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.inner.metrics
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Register a listener on the shared registry.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(&Value, Option<&str>) + Send + Sync + 'static,
    {
        self.inner.bus.on(event, listener);
    }

    /// Encode `{event, data}` and hand it to the writer.
    pub fn send(&self, event: &str, data: Value) -> Result<()> {
        let res = self.enqueue(event, &data);
        if let Err(e) = &res {
            self.inner
                .metrics
                .send_rejected
                .inc(&[("code", e.code().as_str())]);
            tracing::debug!(event, error = %e, "send rejected");
        }
        res
    }

    fn enqueue(&self, event: &str, data: &Value) -> Result<()> {
        if self.state() == ConnectionState::Closed {
            return Err(OtSockError::NotConnected);
        }
        let frame = encode_envelope(self.inner.dialect.shape(), event, data)?;
        self.inner.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => OtSockError::OutboundFull,
            TrySendError::Closed(_) => OtSockError::NotConnected,
        })
    }

    /// Request an orderly shutdown. `close` fires once, right away.
    pub fn close(&self) {
        self.inner.shutdown.notify_one();
        self.mark_closed("closed by client");
    }

    pub(crate) async fn shutdown_requested(&self) {
        self.inner.shutdown.notified().await;
    }

    /// Transition `Connecting -> Open` and fire `open` (plus `reconnect` for
    /// a replacement connection). No-op in any other state.
    pub fn mark_open(&self) {
        let opened = self.inner.state.send_if_modified(|s| {
            if *s == ConnectionState::Connecting {
                *s = ConnectionState::Open;
                true
            } else {
                false
            }
        });
        if !opened {
            return;
        }

        tracing::info!(epoch = self.inner.epoch, "connection open");
        self.inner.bus.emit(OPEN, &Value::Null, None);
        if self.inner.epoch > 0 {
            self.inner.metrics.reconnects.inc(&[]);
            self.inner
                .bus
                .emit(RECONNECT, &json!({ "epoch": self.inner.epoch }), None);
        }
    }

    /// Transition to `Closed` and fire `close` exactly once.
    pub fn mark_closed(&self, reason: &str) {
        let closed = self.inner.state.send_if_modified(|s| {
            if *s != ConnectionState::Closed {
                *s = ConnectionState::Closed;
                true
            } else {
                false
            }
        });
        if closed {
            tracing::info!(epoch = self.inner.epoch, reason, "connection closed");
            self.inner.bus.emit(CLOSE, &json!({ "reason": reason }), None);
        }
    }

    /// Dispatch one inbound text frame. Returns the number of listeners run.
    ///
    /// Malformed frames and frames naming a reserved lifecycle event are
    /// dropped and counted. Frames arriving after close are ignored.
    pub fn receive_frame(&self, raw: &str) -> usize {
        if self.state() == ConnectionState::Closed {
            return 0;
        }
        let metrics = &self.inner.metrics;
        metrics.frames_in.inc(&[]);

        let env = match decode_envelope(raw) {
            Ok(env) => env,
            Err(e) => {
                self.drop_malformed(&e);
                return 0;
            }
        };

        if vocab::is_reserved(&env.event) {
            metrics.dropped_frames.inc(&[("reason", "reserved")]);
            tracing::debug!(event = %env.event, "dropping frame with reserved event name");
            return 0;
        }

        let started = Instant::now();
        let ran = self.inner.bus.emit(&env.event, &env.data, Some(raw));
        if ran == 0 {
            metrics.unrouted_events.inc(&[("event", env.event.as_str())]);
            tracing::trace!(event = %env.event, "no listener for event");
        } else {
            metrics
                .dispatch_duration
                .observe(&[("event", env.event.as_str())], started.elapsed());
        }
        ran
    }

    pub(crate) fn drop_unsent(&self, count: u64) {
        self.inner
            .metrics
            .dropped_frames
            .add(&[("reason", "unsent")], count);
        tracing::warn!(count, "discarding frames that never reached the socket");
    }

    pub(crate) fn drop_malformed(&self, err: &OtSockError) {
        self.inner.metrics.dropped_frames.inc(&[("reason", "malformed")]);
        tracing::debug!(error = %err, "dropping malformed frame");
    }
}

impl Channel for MuxConnection {
    fn subscribe(&self, event: &str, listener: Listener) {
        self.inner.bus.subscribe(event, listener);
    }

    fn send(&self, event: &str, data: Value) -> Result<()> {
        MuxConnection::send(self, event, data)
    }

    fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    fn state(&self) -> ConnectionState {
        MuxConnection::state(self)
    }

    fn close(&self) {
        MuxConnection::close(self)
    }
}
