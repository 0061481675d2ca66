//! Typed payload shapes.
//!
//! Operation and selection contents stay opaque (`serde_json::Value`): only
//! the routing fields (client ids, revision) are typed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OtSockError, Result};

/// `doc`: initial document state delivered on connect.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocSnapshot {
    pub document: String,
    pub revision: u64,
    #[serde(default)]
    pub clients: Vec<String>,
}

/// Inbound `join`. Older servers omit the username.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinNotice {
    pub client_id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Outbound `join`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinRequest {
    pub username: String,
}

/// Inbound `quit`: either the bare client id or `{client_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuitNotice {
    Bare(String),
    Notice { client_id: String },
}

impl QuitNotice {
    pub fn client_id(&self) -> &str {
        match self {
            QuitNotice::Bare(id) => id,
            QuitNotice::Notice { client_id } => client_id,
        }
    }
}

/// Inbound `client_id`: the id the server assigned to this client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientIdNotice {
    pub client_id: String,
}

/// Inbound operation: `[client_id, operation, selection]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteOperation(pub String, pub Value, pub Value);

/// Inbound selection: `[client_id, selection]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteSelection(pub String, pub Value);

/// Outbound operation: `[revision, operation, selection]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalOperation(pub u64, pub Value, pub Value);

/// Parse a payload into one of the typed shapes above.
pub fn parse<T: DeserializeOwned>(data: &Value) -> Result<T> {
    T::deserialize(data).map_err(|e| OtSockError::MalformedEnvelope(format!("bad payload: {e}")))
}
