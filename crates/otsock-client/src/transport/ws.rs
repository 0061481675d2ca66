//! Socket driver task.
//!
//! Responsibilities:
//! - Dial the URL; report `open` on success.
//! - Flush queued and new outbound frames in order.
//! - Decode inbound messages and hand text frames to the connection's bus,
//!   one at a time, in arrival order.
//! - Keepalive pings.
//! - Count frames that were queued but never written.
//! - Report `close` exactly once, whatever ends the session.

use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tracing::Instrument;

use otsock_core::error::{OtSockError, Result};

use super::codec::{decode, Inbound};
use super::{ConnectionState, MuxConnection};

pub(crate) async fn drive(
    conn: MuxConnection,
    mut outbound: mpsc::Receiver<String>,
    keepalive: Option<Duration>,
) {
    let span = tracing::info_span!("conn", epoch = conn.epoch(), url = %conn.url());
    async move {
        let ended = run_session(&conn, &mut outbound, keepalive).await;

        // No further frames are accepted; whatever is still queued is lost.
        outbound.close();
        let mut unsent = 0u64;
        while outbound.try_recv().is_ok() {
            unsent += 1;
        }
        if unsent > 0 {
            conn.drop_unsent(unsent);
        }

        match ended {
            Ok(reason) => conn.mark_closed(reason),
            Err(e) => {
                tracing::warn!(error = %e, "connection lost");
                conn.mark_closed(&e.to_string());
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_session(
    conn: &MuxConnection,
    outbound: &mut mpsc::Receiver<String>,
    keepalive: Option<Duration>,
) -> Result<&'static str> {
    let (socket, _response) = tokio_tungstenite::connect_async(conn.url())
        .await
        .map_err(|e| OtSockError::TransportLost(format!("connect failed: {e}")))?;
    let (mut ws_tx, mut ws_rx) = socket.split();

    conn.mark_open();

    let period = keepalive.unwrap_or(Duration::from_secs(3600));
    let mut ping_tick = tokio::time::interval_at(Instant::now() + period, period);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if conn.state() == ConnectionState::Closed {
            let _ = ws_tx.send(Message::Close(None)).await;
            return Ok("closed by client");
        }

        tokio::select! {
            _ = conn.shutdown_requested() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                return Ok("closed by client");
            }

            // outbound writer
            maybe_out = outbound.recv() => {
                let Some(frame) = maybe_out else { return Ok("outbound closed") };
                if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                    conn.drop_unsent(1);
                    return Err(OtSockError::TransportLost(format!("write failed: {e}")));
                }
                conn.metrics().frames_out.inc(&[]);
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else {
                    return Err(OtSockError::TransportLost("stream ended".into()));
                };
                let msg = incoming
                    .map_err(|e| OtSockError::TransportLost(format!("read failed: {e}")))?;
                match decode(msg) {
                    Ok(Inbound::Text(raw)) => {
                        conn.receive_frame(&raw);
                    }
                    Ok(Inbound::Control) => {}
                    Ok(Inbound::Close) => return Ok("closed by peer"),
                    Err(e) => conn.drop_malformed(&e),
                }
            }

            // keepalive
            _ = ping_tick.tick(), if keepalive.is_some() => {
                ws_tx
                    .send(Message::Ping(Bytes::new()))
                    .await
                    .map_err(|e| OtSockError::TransportLost(format!("ping failed: {e}")))?;
            }
        }
    }
}
