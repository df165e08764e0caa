use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The event kinds a client may put on the wire.
///
/// `Join` carries a document id and changes room membership; every other
/// kind is an opaque delta that is fanned out to the sender's room peers
/// without inspection. Messages with any other `event` value fail to
/// decode and are dropped at the transport edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayEventKind {
    Join,
    DocContent,
    NewComment,
}

impl RelayEventKind {
    /// Wire name of the kind, for log fields.
    pub fn event_name(&self) -> &'static str {
        match self {
            RelayEventKind::Join => "join",
            RelayEventKind::DocContent => "doc_content",
            RelayEventKind::NewComment => "new_comment",
        }
    }

    /// Whether the kind is relayed verbatim to room peers.
    ///
    /// New delta kinds only need a variant here; the router never looks
    /// inside their payloads.
    pub fn passes_through(&self) -> bool {
        match self {
            RelayEventKind::Join => false,
            RelayEventKind::DocContent | RelayEventKind::NewComment => true,
        }
    }
}

/// A single client-to-server or server-to-client message.
///
/// The payload is untyped on purpose: the relay forwards whatever JSON the
/// editor produced, byte-for-byte equivalent, and never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayFrame {
    pub event: RelayEventKind,
    pub payload: Value,
}

impl RelayFrame {
    pub fn join(room_id: &str) -> Self {
        RelayFrame {
            event: RelayEventKind::Join,
            payload: Value::String(room_id.to_string()),
        }
    }

    pub fn doc_content(payload: Value) -> Self {
        RelayFrame {
            event: RelayEventKind::DocContent,
            payload,
        }
    }

    pub fn new_comment(payload: Value) -> Self {
        RelayFrame {
            event: RelayEventKind::NewComment,
            payload,
        }
    }
}
