//! Wire message shapes.
//!
//! JSON mirrors of the service's protobuf-style messages. The bidi stream
//! carries [`ClientToServer`] frames up and [`ServerToClient`] frames down;
//! the two deprecated unary calls use the request/response pairs below.

use canopy_core::event::EventPayload;
use canopy_core::model::Forest;
use serde::{Deserialize, Serialize};

/// Device → controller frame: exactly one payload.
///
/// Serializes externally tagged, matching the proto oneof encoding:
/// `{"event": {…}}` or `{"forest": {…}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientToServer {
    Event(EventPayload),
    Forest(Forest),
}

/// Payload of a pull-request. Carries nothing; presence is the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetForest {}

/// Controller → device frame.
///
/// The peer sends empty frames as flow-control acks — `{}` parses to a
/// message with no request in it and is ignored. Unknown members are ignored
/// too; the action set is closed on our side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerToClient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_forest: Option<GetForest>,
}

impl ServerToClient {
    /// An empty ack frame.
    pub fn ack() -> Self {
        Self::default()
    }

    /// A pull-request frame.
    pub fn pull() -> Self {
        Self {
            get_forest: Some(GetForest {}),
        }
    }

    /// Whether this frame asks for a fresh forest.
    pub fn is_pull(&self) -> bool {
        self.get_forest.is_some()
    }
}

/// Request body of the deprecated `SendEvent` unary call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    #[serde(default)]
    pub event: EventPayload,
}

/// Response of the deprecated `SendForest` unary call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForestResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of the deprecated `SendEvent` unary call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
