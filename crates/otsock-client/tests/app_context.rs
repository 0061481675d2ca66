#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use otsock_client::app_state::{AppContext, DocumentState};
use otsock_client::dispatch::EventBus;
use otsock_client::obs::ClientMetrics;
use otsock_client::transport::{ConnectionOptions, MuxConnection};
use serde_json::json;
use tokio::sync::mpsc;

fn attached(epoch: u64, bus: Arc<EventBus>) -> (MuxConnection, AppContext, mpsc::Receiver<String>) {
    let metrics = Arc::new(ClientMetrics::new());
    let (conn, wire) = MuxConnection::detached(
        "ws://test.invalid/ws",
        &ConnectionOptions::default(),
        bus,
        Arc::clone(&metrics),
        epoch,
    );
    let app = AppContext::attach(Arc::new(conn.clone()), metrics);
    (conn, app, wire)
}

#[test]
fn snapshot_join_quit_update_roster_and_buffer() {
    let (conn, app, _wire) = attached(0, Arc::new(EventBus::new()));
    conn.mark_open();

    conn.receive_frame(r#"{"event":"doc","data":{"document":"x","revision":0,"clients":["c1"]}}"#);
    assert_eq!(app.roster(), ["c1"]);
    assert_eq!(
        app.document(),
        DocumentState {
            text: "x".into(),
            revision: 0
        }
    );

    conn.receive_frame(r#"{"event":"join","data":{"client_id":"c2","username":"bob"}}"#);
    assert_eq!(app.roster(), ["c1", "c2"]);
    assert_eq!(app.members()[1].username.as_deref(), Some("bob"));

    conn.receive_frame(r#"{"event":"quit","data":"c1"}"#);
    assert_eq!(app.roster(), ["c2"]);
}

#[test]
fn later_snapshots_do_not_reseed() {
    let (conn, app, _wire) = attached(0, Arc::new(EventBus::new()));
    conn.mark_open();

    conn.receive_frame(r#"{"event":"doc","data":{"document":"x","revision":0,"clients":["c1"]}}"#);
    conn.receive_frame(r#"{"event":"doc","data":{"document":"xy","revision":1,"clients":["c7","c8"]}}"#);

    assert_eq!(app.roster(), ["c1"]);
    assert_eq!(app.document().text, "xy");
    assert_eq!(app.document().revision, 1);
}

#[test]
fn assigned_client_id_is_recorded() {
    let (conn, app, _wire) = attached(0, Arc::new(EventBus::new()));
    conn.mark_open();
    assert_eq!(app.own_client_id(), None);

    conn.receive_frame(r#"{"event":"client_id","data":{"client_id":"c4"}}"#);
    assert_eq!(app.own_client_id().as_deref(), Some("c4"));
}

#[test]
fn reconnect_resets_roster_and_rejoins() {
    let bus = Arc::new(EventBus::new());
    let (conn, app, mut wire) = attached(0, Arc::clone(&bus));
    conn.mark_open();

    app.join("alice").unwrap();
    conn.receive_frame(r#"{"event":"client_id","data":{"client_id":"c1"}}"#);
    conn.receive_frame(r#"{"event":"doc","data":{"document":"","revision":0,"clients":["c1","c2"]}}"#);
    assert_eq!(app.roster(), ["c1", "c2"]);

    // What a replacement connection announces on the shared bus.
    bus.emit("reconnect", &json!({"epoch": 1}), None);

    assert!(app.roster().is_empty());
    assert_eq!(app.own_client_id(), None);
    let join = r#"{"event":"join","data":{"username":"alice"}}"#;
    assert_eq!(wire.try_recv().unwrap(), join);
    assert_eq!(wire.try_recv().unwrap(), join);

    conn.receive_frame(r#"{"event":"doc","data":{"document":"","revision":4,"clients":["c2","c3"]}}"#);
    assert_eq!(app.roster(), ["c2", "c3"]);
}

#[test]
fn no_rejoin_without_a_prior_join() {
    let bus = Arc::new(EventBus::new());
    let (conn, _app, mut wire) = attached(0, Arc::clone(&bus));
    conn.mark_open();

    bus.emit("reconnect", &json!({"epoch": 1}), None);
    assert!(wire.try_recv().is_err());
}
