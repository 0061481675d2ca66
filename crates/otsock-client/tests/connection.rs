#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use otsock_client::dispatch::EventBus;
use otsock_client::obs::ClientMetrics;
use otsock_client::transport::{ConnectionOptions, ConnectionState, MuxConnection};
use otsock_core::protocol::Dialect;
use otsock_core::ErrorCode;
use serde_json::{json, Value};
use tokio::sync::mpsc;

fn detached(dialect: Dialect, queue: usize, epoch: u64) -> (MuxConnection, mpsc::Receiver<String>) {
    let opts = ConnectionOptions {
        dialect,
        outbound_queue: queue,
        keepalive: None,
    };
    MuxConnection::detached(
        "ws://test.invalid/ws",
        &opts,
        Arc::new(EventBus::new()),
        Arc::new(ClientMetrics::new()),
        epoch,
    )
}

fn record(conn: &MuxConnection, event: &str, log: &Arc<Mutex<Vec<(String, Value)>>>) {
    let log = Arc::clone(log);
    let name = event.to_owned();
    conn.on(event, move |data, _raw| {
        log.lock().unwrap().push((name.clone(), data.clone()));
    });
}

#[test]
fn sent_frame_is_delivered_intact_to_a_peer() {
    for dialect in [Dialect::Classic, Dialect::Compact] {
        let (sender, mut wire) = detached(dialect, 8, 0);
        let (receiver, _rx) = detached(Dialect::Classic, 8, 0);
        receiver.mark_open();

        let got = Arc::new(Mutex::new(Vec::new()));
        record(&receiver, "selection", &got);

        let data = json!({"ranges": [{"anchor": 1, "head": 4}], "nested": {"a": [null, true]}});
        sender.send("selection", data.clone()).unwrap();

        let frame = wire.try_recv().unwrap();
        assert_eq!(receiver.receive_frame(&frame), 1);
        assert_eq!(*got.lock().unwrap(), vec![("selection".to_owned(), data)]);
    }
}

#[test]
fn classic_and_compact_frames_differ_only_in_shape() {
    let (classic, mut classic_wire) = detached(Dialect::Classic, 8, 0);
    let (compact, mut compact_wire) = detached(Dialect::Compact, 8, 0);

    classic.send("ack", Value::Null).unwrap();
    compact.send("ok", Value::Null).unwrap();

    assert_eq!(classic_wire.try_recv().unwrap(), r#"{"event":"ack","data":null}"#);
    assert_eq!(compact_wire.try_recv().unwrap(), r#"{"e":"ok","d":null}"#);
}

#[test]
fn malformed_frames_are_dropped_and_counted() {
    let (conn, _rx) = detached(Dialect::Classic, 8, 0);
    conn.mark_open();
    conn.on("doc", |_, _| panic!("must not run"));

    for raw in [
        "not json",
        "[1,2,3]",
        r#"{"data":{}}"#,
        r#"{"event":"","data":{}}"#,
        r#"{"event":42}"#,
    ] {
        assert_eq!(conn.receive_frame(raw), 0, "{raw}");
    }

    let m = conn.metrics();
    assert_eq!(m.frames_in.total(), 5);
    assert_eq!(m.dropped_frames.get(&[("reason", "malformed")]), 5);
    assert_eq!(conn.state(), ConnectionState::Open);
}

#[test]
fn reserved_names_from_the_wire_are_ignored() {
    let (conn, _rx) = detached(Dialect::Classic, 8, 0);
    let log = Arc::new(Mutex::new(Vec::new()));
    for ev in ["open", "close", "reconnect"] {
        record(&conn, ev, &log);
    }
    conn.mark_open();
    log.lock().unwrap().clear();

    assert_eq!(conn.receive_frame(r#"{"event":"close","data":null}"#), 0);
    assert_eq!(conn.receive_frame(r#"{"e":"reconnect"}"#), 0);
    assert_eq!(conn.receive_frame(r#"{"event":"open"}"#), 0);

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(conn.metrics().dropped_frames.get(&[("reason", "reserved")]), 3);
    assert_eq!(conn.state(), ConnectionState::Open);
}

#[test]
fn unrouted_events_are_counted() {
    let (conn, _rx) = detached(Dialect::Classic, 8, 0);
    conn.mark_open();
    assert_eq!(conn.receive_frame(r#"{"event":"cursor","data":{}}"#), 0);
    assert_eq!(conn.metrics().unrouted_events.get(&[("event", "cursor")]), 1);
}

#[test]
fn frames_queue_while_connecting_and_fail_after_close() {
    let (conn, mut wire) = detached(Dialect::Classic, 8, 0);
    assert_eq!(conn.state(), ConnectionState::Connecting);

    conn.send("join", json!({"username": "alice"})).unwrap();
    assert_eq!(
        wire.try_recv().unwrap(),
        r#"{"event":"join","data":{"username":"alice"}}"#
    );

    conn.close();
    let err = conn.send("join", json!({"username": "alice"})).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotConnected);
    assert!(wire.try_recv().is_err());
    assert_eq!(
        conn.metrics().send_rejected.get(&[("code", "NOT_CONNECTED")]),
        1
    );
}

#[test]
fn full_outbound_queue_is_reported() {
    let (conn, _wire) = detached(Dialect::Classic, 2, 0);
    conn.send("selection", Value::Null).unwrap();
    conn.send("selection", Value::Null).unwrap();
    let err = conn.send("selection", Value::Null).unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutboundFull);
}

#[test]
fn send_after_writer_is_gone_is_not_connected() {
    let (conn, wire) = detached(Dialect::Classic, 2, 0);
    drop(wire);
    let err = conn.send("ack", Value::Null).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotConnected);
}

#[test]
fn lifecycle_events_fire_once() {
    let (conn, _rx) = detached(Dialect::Classic, 8, 0);
    let log = Arc::new(Mutex::new(Vec::new()));
    for ev in ["open", "close", "reconnect"] {
        record(&conn, ev, &log);
    }

    conn.mark_open();
    conn.mark_open();
    conn.mark_closed("server went away");
    conn.mark_closed("again");
    conn.close();

    let log = log.lock().unwrap();
    let names: Vec<&str> = log.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["open", "close"]);
    assert_eq!(log[1].1, json!({"reason": "server went away"}));
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[test]
fn frames_after_close_are_ignored() {
    let (conn, _rx) = detached(Dialect::Classic, 8, 0);
    conn.on("ack", |_, _| panic!("must not run"));
    conn.mark_open();
    conn.mark_closed("gone");
    assert_eq!(conn.receive_frame(r#"{"event":"ack"}"#), 0);
    assert_eq!(conn.metrics().frames_in.total(), 0);
}

#[test]
fn replacement_connection_announces_reconnect_after_open() {
    let (conn, _rx) = detached(Dialect::Classic, 8, 3);
    let log = Arc::new(Mutex::new(Vec::new()));
    for ev in ["open", "reconnect"] {
        record(&conn, ev, &log);
    }

    conn.mark_open();

    let log = log.lock().unwrap();
    let names: Vec<&str> = log.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["open", "reconnect"]);
    assert_eq!(log[1].1, json!({"epoch": 3}));
    assert_eq!(conn.metrics().reconnects.total(), 1);
}

#[tokio::test]
async fn frames_queued_for_a_failed_dial_are_counted_as_unsent() {
    // Grab a free port, then release it so the dial is refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let opts = ConnectionOptions {
        dialect: Dialect::Classic,
        outbound_queue: 8,
        keepalive: None,
    };
    let conn = MuxConnection::connect(
        format!("ws://127.0.0.1:{port}/ws"),
        &opts,
        Arc::new(EventBus::new()),
        Arc::new(ClientMetrics::new()),
    );
    let log = Arc::new(Mutex::new(Vec::new()));
    record(&conn, "close", &log);

    // The driver has not run yet, so both frames are queued.
    conn.send("join", json!({"username": "alice"})).unwrap();
    conn.send("operation", json!([0, ["x"], null])).unwrap();

    let mut state = conn.subscribe_state();
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.wait_for(|s| *s == ConnectionState::Closed),
    )
    .await
    .expect("dial never failed")
    .unwrap();

    let m = conn.metrics();
    assert_eq!(m.dropped_frames.get(&[("reason", "unsent")]), 2);
    assert_eq!(m.frames_out.total(), 0);
    assert!(m.render().contains(r#"otsock_dropped_frames_total{reason="unsent"} 2"#));
    assert_eq!(log.lock().unwrap().len(), 1);

    let err = conn.send("ack", Value::Null).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotConnected);
}
