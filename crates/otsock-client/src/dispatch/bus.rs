use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// Listener callback: payload plus the raw frame text when the event came
/// off the wire (`None` for locally synthesized events).
pub type Listener = Arc<dyn Fn(&Value, Option<&str>) + Send + Sync>;

/// Named-event registry: event name -> listeners in registration order.
///
/// Registering never fails and never de-duplicates. Emitting an event with no
/// listeners is a no-op.
#[derive(Default)]
pub struct EventBus {
    listeners: DashMap<String, Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
        }
    }

    /// Register a listener. Each call adds one more.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(&Value, Option<&str>) + Send + Sync + 'static,
    {
        self.subscribe(event, Arc::new(listener));
    }

    /// Register an already boxed listener.
    pub fn subscribe(&self, event: &str, listener: Listener) {
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Invoke every listener for `event` in registration order.
    /// Returns how many ran.
    ///
    /// The listener list is snapshotted first, so a listener may register
    /// further listeners without deadlocking; those run from the next emit.
    pub fn emit(&self, event: &str, data: &Value, raw: Option<&str>) -> usize {
        let snapshot: Vec<Listener> = match self.listeners.get(event) {
            Some(list) => list.value().clone(),
            None => return 0,
        };
        for listener in &snapshot {
            listener(data, raw);
        }
        snapshot.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map(|l| l.len()).unwrap_or(0)
    }
}
