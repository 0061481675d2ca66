//! Wire event -> session event translation.
//!
//! Pure and stateless. Operation and selection payloads are moved through
//! untouched; only the routing fields are read.

use serde_json::Value;

use otsock_core::error::Result;
use otsock_core::protocol::payload::{
    self, ClientIdNotice, DocSnapshot, JoinNotice, QuitNotice, RemoteOperation, RemoteSelection,
};
use otsock_core::protocol::WireEvent;

/// Adapter-level event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Document snapshot with the clients already connected.
    Snapshot(DocSnapshot),
    Joined {
        client_id: String,
        username: Option<String>,
    },
    Left {
        client_id: String,
    },
    /// Id the server assigned to this client.
    AssignedId {
        client_id: String,
    },
    Ack,
    Operation(Value),
    Selection {
        client_id: String,
        selection: Value,
    },
    Reconnect,
}

/// Translate one inbound event. Payloads of the wrong shape yield nothing.
///
/// An operation fans out to `Operation` followed by `Selection`, since every
/// operation carries the sender's resulting selection.
pub fn translate(event: WireEvent, data: &Value) -> Vec<SessionEvent> {
    match decode(event, data) {
        Ok(events) => events,
        Err(e) => {
            tracing::debug!(?event, error = %e, "ignoring payload with unexpected shape");
            Vec::new()
        }
    }
}

fn decode(event: WireEvent, data: &Value) -> Result<Vec<SessionEvent>> {
    let events = match event {
        WireEvent::Doc => vec![SessionEvent::Snapshot(payload::parse::<DocSnapshot>(data)?)],
        WireEvent::Join => {
            let JoinNotice { client_id, username } = payload::parse(data)?;
            vec![SessionEvent::Joined { client_id, username }]
        }
        WireEvent::Quit => {
            let notice: QuitNotice = payload::parse(data)?;
            vec![SessionEvent::Left {
                client_id: notice.client_id().to_owned(),
            }]
        }
        WireEvent::ClientId => {
            let ClientIdNotice { client_id } = payload::parse(data)?;
            vec![SessionEvent::AssignedId { client_id }]
        }
        WireEvent::Ack => vec![SessionEvent::Ack],
        WireEvent::Operation => {
            let RemoteOperation(client_id, operation, selection) = payload::parse(data)?;
            vec![
                SessionEvent::Operation(operation),
                SessionEvent::Selection { client_id, selection },
            ]
        }
        WireEvent::Selection => {
            let RemoteSelection(client_id, selection) = payload::parse(data)?;
            vec![SessionEvent::Selection { client_id, selection }]
        }
        WireEvent::Reconnect => vec![SessionEvent::Reconnect],
    };
    Ok(events)
}
