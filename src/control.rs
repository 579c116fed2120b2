//! Asynchronous control protocol
//!
//! Requests arrive as `{ kind, payload? }` and carry a oneshot reply sender;
//! the reply `{ kind, ...resultFields }` is posted once the operation
//! completes. This is one-shot request/response, not a stream. Unknown kinds
//! are logged and dropped without a reply, so callers must apply their own
//! timeout (dropping the sender closes the caller's receiver, which serves as
//! that signal).

use crate::error::{CacheGateError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Wire shape of a control request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Request kind, e.g. "QUERY_CACHE_SIZE"
    pub kind: String,
    /// Optional request payload; currently unused by all recognized kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl WireMessage {
    /// Build a bare request of the given kind
    pub fn of_kind(kind: impl Into<String>) -> Self {
        WireMessage {
            kind: kind.into(),
            payload: None,
        }
    }
}

/// Recognized control request kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate an installed-but-waiting engine instance immediately
    ForceActivate,
    /// Sum declared content-lengths across every segment
    QueryCacheSize,
    /// Delete every segment unconditionally
    ClearAll,
}

impl ControlMessage {
    /// Parse a wire message into a recognized kind
    ///
    /// # Returns
    /// * `Err(UnknownControlMessage)` for unrecognized kinds
    pub fn parse(wire: &WireMessage) -> Result<Self> {
        match wire.kind.as_str() {
            "FORCE_ACTIVATE" => Ok(ControlMessage::ForceActivate),
            "QUERY_CACHE_SIZE" => Ok(ControlMessage::QueryCacheSize),
            "CLEAR_ALL" => Ok(ControlMessage::ClearAll),
            other => Err(CacheGateError::UnknownControlMessage(other.to_string())),
        }
    }

    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::ForceActivate => "FORCE_ACTIVATE",
            ControlMessage::QueryCacheSize => "QUERY_CACHE_SIZE",
            ControlMessage::ClearAll => "CLEAR_ALL",
        }
    }
}

/// Reply posted on the caller-supplied channel once an operation completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ControlReply {
    /// Reply to FORCE_ACTIVATE
    #[serde(rename = "ACTIVATED")]
    Activated,
    /// Reply to QUERY_CACHE_SIZE: total declared byte count
    #[serde(rename = "CACHE_SIZE")]
    CacheSize { size: u64 },
    /// Reply to CLEAR_ALL
    #[serde(rename = "CACHE_CLEARED")]
    Cleared,
}

/// A control request paired with its reply destination
pub struct ControlRequest {
    pub message: WireMessage,
    pub reply: oneshot::Sender<ControlReply>,
}

impl ControlRequest {
    /// Build a request and the receiver its reply will arrive on
    pub fn new(message: WireMessage) -> (Self, oneshot::Receiver<ControlReply>) {
        let (reply, rx) = oneshot::channel();
        (ControlRequest { message, reply }, rx)
    }
}
