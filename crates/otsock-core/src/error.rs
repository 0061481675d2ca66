//! Shared error type across otsock crates.

use thiserror::Error;

/// Stable error codes, used for metric labels and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Inbound frame is not JSON or lacks the event field.
    MalformedEnvelope,
    /// Outbound send on a connection that is not (or no longer) usable.
    NotConnected,
    /// Outbound queue is at capacity.
    OutboundFull,
    /// The physical connection failed or went away.
    TransportLost,
    /// Configuration rejected by parsing or validation.
    BadConfig,
    /// Unsupported config or protocol version.
    UnsupportedVersion,
    /// Internal invariant broken.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MalformedEnvelope => "MALFORMED_ENVELOPE",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::OutboundFull => "OUTBOUND_FULL",
            ErrorCode::TransportLost => "TRANSPORT_LOST",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, OtSockError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum OtSockError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("not connected")]
    NotConnected,
    #[error("outbound queue full")]
    OutboundFull,
    #[error("transport lost: {0}")]
    TransportLost(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl OtSockError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            OtSockError::MalformedEnvelope(_) => ErrorCode::MalformedEnvelope,
            OtSockError::NotConnected => ErrorCode::NotConnected,
            OtSockError::OutboundFull => ErrorCode::OutboundFull,
            OtSockError::TransportLost(_) => ErrorCode::TransportLost,
            OtSockError::BadConfig(_) => ErrorCode::BadConfig,
            OtSockError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            OtSockError::Internal(_) => ErrorCode::Internal,
        }
    }
}
