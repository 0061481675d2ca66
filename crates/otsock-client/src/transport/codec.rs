//! Decode-once codec for the socket driver.
//!
//! - Text frames are passed through as-is.
//! - Binary frames must be UTF-8 JSON; anything else is malformed.
//! - Ping/Pong are answered by tungstenite itself and surface as `Control`.

use bytes::Bytes;
use tokio_tungstenite::tungstenite::Message;

use otsock_core::error::{OtSockError, Result};

#[derive(Debug)]
pub enum Inbound {
    Text(String),
    Control,
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => Ok(Inbound::Text(s.as_str().to_owned())),
        Message::Binary(b) => utf8_frame(b).map(Inbound::Text),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(Inbound::Control),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

fn utf8_frame(b: Bytes) -> Result<String> {
    String::from_utf8(b.to_vec())
        .map_err(|e| OtSockError::MalformedEnvelope(format!("binary frame is not utf-8: {e}")))
}
