//! Wire protocol modules.
//!
//! - `envelope`: the JSON frame wrapper (`{event, data}` or legacy `{e, d}`).
//! - `vocab`: the event names, their historical aliases, and outbound dialects.
//! - `payload`: typed shapes of the payloads the client understands.
//!
//! Decoding is panic-free: malformed input is reported as `OtSockError` so the
//! caller can drop it and keep the connection alive.

pub mod envelope;
pub mod payload;
pub mod vocab;

pub use envelope::{decode_envelope, encode_envelope, Envelope, EnvelopeShape};
pub use vocab::{Dialect, WireEvent};
