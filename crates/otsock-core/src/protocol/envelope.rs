//! Envelope codec.
//!
//! Two envelope shapes have been used on the wire:
//! - long: `{ "event": <name>, "data": <json> }`
//! - short: `{ "e": <name>, "d": <json> }`
//!
//! Decoding accepts both. The event key picks the shape; data is read from
//! that shape's key, falling back to the other shape's key for mixed frames
//! such as `{"event": .., "d": ..}`. Unknown extra fields are ignored.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{OtSockError, Result};

/// Which key pair an envelope uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `{event, data}`
    Long,
    /// `{e, d}`
    Short,
}

impl EnvelopeShape {
    fn keys(self) -> (&'static str, &'static str) {
        match self {
            EnvelopeShape::Long => ("event", "data"),
            EnvelopeShape::Short => ("e", "d"),
        }
    }

    fn other(self) -> Self {
        match self {
            EnvelopeShape::Long => EnvelopeShape::Short,
            EnvelopeShape::Short => EnvelopeShape::Long,
        }
    }
}

/// Decoded envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Event name as it appeared on the wire (aliases are not resolved here).
    pub event: String,
    /// Payload; `Null` when the frame carried none.
    pub data: Value,
    /// Shape the frame was encoded with.
    pub shape: EnvelopeShape,
}

#[derive(Serialize)]
struct LongRef<'a> {
    event: &'a str,
    data: &'a Value,
}

#[derive(Serialize)]
struct ShortRef<'a> {
    e: &'a str,
    d: &'a Value,
}

/// Decode one text frame into an envelope.
pub fn decode_envelope(raw: &str) -> Result<Envelope> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| OtSockError::MalformedEnvelope(format!("invalid json: {e}")))?;

    let Value::Object(mut map) = value else {
        return Err(OtSockError::MalformedEnvelope("envelope must be an object".into()));
    };

    let shape = if map.contains_key("event") {
        EnvelopeShape::Long
    } else if map.contains_key("e") {
        EnvelopeShape::Short
    } else {
        return Err(OtSockError::MalformedEnvelope("missing event field".into()));
    };

    let (event_key, data_key) = shape.keys();
    let (_, other_data_key) = shape.other().keys();
    let event = take_event(&mut map, event_key)?;
    let data = map
        .remove(data_key)
        .or_else(|| map.remove(other_data_key))
        .unwrap_or(Value::Null);

    Ok(Envelope { event, data, shape })
}

fn take_event(map: &mut Map<String, Value>, key: &str) -> Result<String> {
    match map.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) => Err(OtSockError::MalformedEnvelope("empty event name".into())),
        Some(_) => Err(OtSockError::MalformedEnvelope("event name must be a string".into())),
        None => Err(OtSockError::MalformedEnvelope("missing event field".into())),
    }
}

/// Encode an envelope with the given shape.
pub fn encode_envelope(shape: EnvelopeShape, event: &str, data: &Value) -> Result<String> {
    if event.is_empty() {
        return Err(OtSockError::MalformedEnvelope("empty event name".into()));
    }
    let encoded = match shape {
        EnvelopeShape::Long => serde_json::to_string(&LongRef { event, data }),
        EnvelopeShape::Short => serde_json::to_string(&ShortRef { e: event, d: data }),
    };
    encoded.map_err(|e| OtSockError::Internal(format!("envelope encode failed: {e}")))
}
