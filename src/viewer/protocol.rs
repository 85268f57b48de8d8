//! Messages from the embedded viewer document to the host.
//!
//! The document posts JSON text envelopes `{"v": 1, "type": "log", "message": "..."}`
//! through the native bridge, or into a global outbox array when no bridge
//! exists. Nothing flows the other way once the document is loaded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, info, warn};

/// Envelope version written by the current document
pub const PROTOCOL_VERSION: u32 = 1;

/// Global array the document pushes envelopes into when no native bridge exists
pub const OUTBOX_GLOBAL: &str = "__flat3dOutbox";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Log,
    Error,
}

impl MessageKind {
    pub const ALL: [MessageKind; 2] = [MessageKind::Log, MessageKind::Error];

    fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "log" => Some(MessageKind::Log),
            "error" => Some(MessageKind::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Log => f.write_str("log"),
            MessageKind::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Envelope {
    pub v: u32,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub message: String,
}

impl Envelope {
    pub fn new(kind: MessageKind, message: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            kind,
            message: message.into(),
        }
    }
}

/// Wire shape before the kind and version are checked. Envelopes without
/// `v` predate versioning and count as version 1.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default = "legacy_version")]
    v: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: String,
}

fn legacy_version() -> u32 {
    1
}

/// Outcome of decoding one payload from the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message(Envelope),
    /// Well-formed JSON whose version or kind this host does not know
    Unsupported { version: u32, kind: String },
    /// Not an envelope at all
    Malformed { reason: String },
}

pub fn decode(raw: &str) -> Inbound {
    let envelope: RawEnvelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            return Inbound::Malformed {
                reason: e.to_string(),
            }
        }
    };

    match MessageKind::from_wire(&envelope.kind) {
        Some(kind) if envelope.v == PROTOCOL_VERSION => Inbound::Message(Envelope {
            v: envelope.v,
            kind,
            message: envelope.message,
        }),
        _ => Inbound::Unsupported {
            version: envelope.v,
            kind: envelope.kind,
        },
    }
}

pub type Handler = Box<dyn FnMut(&Envelope) + Send>;

/// What happened to a payload handed to [`HandlerRegistry::dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Handled(Envelope),
    /// Decoded, but nobody registered for its kind
    Unhandled(Envelope),
    /// Logged raw and dropped
    Rejected,
}

/// Host-side handlers keyed by message kind.
///
/// Payloads that fail to decode, or that no handler claims, are logged raw
/// instead of being dropped silently.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<MessageKind, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that relays log and error envelopes into tracing
    pub fn with_logging() -> Self {
        let mut registry = Self::new();
        registry.on(MessageKind::Log, |e| info!("[viewer] {}", e.message));
        registry.on(MessageKind::Error, |e| error!("[viewer] {}", e.message));
        registry
    }

    /// Register `handler` for `kind`, replacing any previous one
    pub fn on(&mut self, kind: MessageKind, handler: impl FnMut(&Envelope) + Send + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn handles(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn dispatch(&mut self, raw: &str) -> Dispatch {
        match decode(raw) {
            Inbound::Message(envelope) => self.dispatch_envelope(envelope),
            Inbound::Unsupported { version, kind } => {
                warn!("[viewer] unsupported message v{} kind={:?}: {}", version, kind, raw);
                Dispatch::Rejected
            }
            Inbound::Malformed { reason } => {
                warn!("[viewer] malformed message ({}): {}", reason, raw);
                Dispatch::Rejected
            }
        }
    }

    pub fn dispatch_envelope(&mut self, envelope: Envelope) -> Dispatch {
        match self.handlers.get_mut(&envelope.kind) {
            Some(handler) => {
                handler(&envelope);
                Dispatch::Handled(envelope)
            }
            None => {
                warn!("[viewer] no handler for {} message: {}", envelope.kind, envelope.message);
                Dispatch::Unhandled(envelope)
            }
        }
    }
}
