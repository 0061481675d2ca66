#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;
use otsock_client::transport::codec::{decode, Inbound};
use otsock_core::ErrorCode;
use tokio_tungstenite::tungstenite::Message;

#[test]
fn text_and_utf8_binary_become_text() {
    match decode(Message::text(r#"{"event":"ack"}"#)).unwrap() {
        Inbound::Text(s) => assert_eq!(s, r#"{"event":"ack"}"#),
        other => panic!("unexpected {other:?}"),
    }
    match decode(Message::Binary(Bytes::from_static(br#"{"e":"ok"}"#))).unwrap() {
        Inbound::Text(s) => assert_eq!(s, r#"{"e":"ok"}"#),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn non_utf8_binary_is_malformed() {
    let err = decode(Message::Binary(Bytes::from_static(&[0xff, 0xfe]))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MalformedEnvelope);
}

#[test]
fn control_and_close_frames() {
    assert!(matches!(decode(Message::Ping(Bytes::new())).unwrap(), Inbound::Control));
    assert!(matches!(decode(Message::Close(None)).unwrap(), Inbound::Close));
}
