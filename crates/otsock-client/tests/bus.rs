#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use otsock_client::dispatch::EventBus;
use serde_json::{json, Value};

#[test]
fn listeners_run_in_registration_order() {
    let bus = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for i in 0..3 {
        let seen = Arc::clone(&seen);
        bus.on("doc", move |data, _raw| {
            seen.lock().unwrap().push((i, data.clone()));
        });
    }

    let ran = bus.emit("doc", &json!({"document": "x"}), None);
    assert_eq!(ran, 3);

    let seen = seen.lock().unwrap();
    let order: Vec<i32> = seen.iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert!(seen.iter().all(|(_, d)| d == &json!({"document": "x"})));
}

#[test]
fn unknown_event_is_a_noop() {
    let bus = EventBus::new();
    bus.on("join", |_, _| panic!("must not run"));
    assert_eq!(bus.emit("quit", &Value::Null, None), 0);
    assert_eq!(bus.listener_count("quit"), 0);
    assert_eq!(bus.listener_count("join"), 1);
}

#[test]
fn raw_frame_is_passed_through() {
    let bus = EventBus::new();
    let raw_seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&raw_seen);
    bus.on("ack", move |_, raw| {
        *sink.lock().unwrap() = raw.map(str::to_owned);
    });

    bus.emit("ack", &Value::Null, Some(r#"{"event":"ack"}"#));
    assert_eq!(raw_seen.lock().unwrap().as_deref(), Some(r#"{"event":"ack"}"#));
}

#[test]
fn listener_may_register_during_emit() {
    let bus = Arc::new(EventBus::new());
    let inner_bus = Arc::clone(&bus);
    bus.on("doc", move |_, _| {
        inner_bus.on("doc", |_, _| {});
    });

    // The listener added mid-dispatch only runs on the next emit.
    assert_eq!(bus.emit("doc", &Value::Null, None), 1);
    assert_eq!(bus.emit("doc", &Value::Null, None), 2);
}
