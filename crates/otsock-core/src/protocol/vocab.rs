//! Event vocabulary.
//!
//! The acknowledgement, operation, and selection events were renamed over the
//! protocol's history (`ack`/`ok`, `operation`/`op`, `selection`/`sel`).
//! Inbound, every alias is recognised. Outbound, a [`Dialect`] picks exactly
//! one name per event together with the envelope shape.

use serde::Deserialize;

use super::envelope::EnvelopeShape;

/// Lifecycle event fired when a physical connection opens.
pub const OPEN: &str = "open";
/// Lifecycle event fired when a physical connection closes.
pub const CLOSE: &str = "close";
/// Locally synthesized event marking a new connection epoch.
pub const RECONNECT: &str = "reconnect";

/// Names that only the client itself may emit.
pub const RESERVED: [&str; 3] = [OPEN, CLOSE, RECONNECT];

/// Whether an event name is reserved for local lifecycle signals.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Events of the editor protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireEvent {
    /// Document snapshot with revision and connected clients (in).
    Doc,
    /// Client joined (in), or join request with a username (out).
    Join,
    /// Client left (in).
    Quit,
    /// Identifier assigned to this client after its join (in).
    ClientId,
    /// Operation with the sender's resulting selection (in/out).
    Operation,
    /// Selection change (in/out).
    Selection,
    /// Acknowledgement of the client's pending operation (in).
    Ack,
    /// New connection epoch (local only, never on the wire).
    Reconnect,
}

impl WireEvent {
    /// Every event, in a fixed order.
    pub const ALL: [WireEvent; 8] = [
        WireEvent::Doc,
        WireEvent::Join,
        WireEvent::Quit,
        WireEvent::ClientId,
        WireEvent::Operation,
        WireEvent::Selection,
        WireEvent::Ack,
        WireEvent::Reconnect,
    ];

    /// All names this event may arrive under.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            WireEvent::Doc => &["doc"],
            WireEvent::Join => &["join"],
            WireEvent::Quit => &["quit"],
            WireEvent::ClientId => &["client_id"],
            WireEvent::Operation => &["operation", "op"],
            WireEvent::Selection => &["selection", "sel"],
            WireEvent::Ack => &["ack", "ok"],
            WireEvent::Reconnect => &[RECONNECT],
        }
    }

    /// Resolve a received name (any alias) to its event.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ev| ev.aliases().contains(&name))
    }

    /// True for events synthesized locally rather than received.
    pub fn is_local(self) -> bool {
        matches!(self, WireEvent::Reconnect)
    }
}

/// Outbound dialect: envelope shape plus one canonical name per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `{event, data}` with long names (`operation`, `selection`, `ack`).
    #[default]
    Classic,
    /// `{e, d}` with short names (`op`, `sel`, `ok`).
    Compact,
}

impl Dialect {
    /// Name to put on the wire for `event`.
    pub fn name(self, event: WireEvent) -> &'static str {
        match (self, event) {
            (Dialect::Compact, WireEvent::Operation) => "op",
            (Dialect::Compact, WireEvent::Selection) => "sel",
            (Dialect::Compact, WireEvent::Ack) => "ok",
            (_, WireEvent::Doc) => "doc",
            (_, WireEvent::Join) => "join",
            (_, WireEvent::Quit) => "quit",
            (_, WireEvent::ClientId) => "client_id",
            (_, WireEvent::Operation) => "operation",
            (_, WireEvent::Selection) => "selection",
            (_, WireEvent::Ack) => "ack",
            (_, WireEvent::Reconnect) => RECONNECT,
        }
    }

    /// Envelope shape for outbound frames.
    pub fn shape(self) -> EnvelopeShape {
        match self {
            Dialect::Classic => EnvelopeShape::Long,
            Dialect::Compact => EnvelopeShape::Short,
        }
    }
}
