use serde_json::Value;

use super::translate::SessionEvent;

/// Callback table of an OT engine.
///
/// Every method defaults to a no-op, so an engine implements only what it
/// handles; a missing entry is silently skipped.
pub trait EditorCallbacks: Send + Sync {
    fn client_left(&self, _client_id: &str) {}
    fn set_name(&self, _client_id: &str, _username: &str) {}
    fn ack(&self) {}
    fn operation(&self, _operation: &Value) {}
    fn selection(&self, _client_id: &str, _selection: &Value) {}
    fn reconnect(&self) {}
}

/// Route a session event to its callback. Snapshot and id assignment have
/// none; a join without a username has nothing to name.
pub(crate) fn invoke(cb: &dyn EditorCallbacks, event: &SessionEvent) {
    match event {
        SessionEvent::Left { client_id } => cb.client_left(client_id),
        SessionEvent::Joined {
            client_id,
            username: Some(name),
        } => cb.set_name(client_id, name),
        SessionEvent::Ack => cb.ack(),
        SessionEvent::Operation(op) => cb.operation(op),
        SessionEvent::Selection {
            client_id,
            selection,
        } => cb.selection(client_id, selection),
        SessionEvent::Reconnect => cb.reconnect(),
        SessionEvent::Joined { username: None, .. }
        | SessionEvent::Snapshot(_)
        | SessionEvent::AssignedId { .. } => {}
    }
}
