//! Batch envelope and server-pushed events.

use crate::commands::Command;
use msgsync_core::{Message, Subject};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One batched request: the full command queue drained at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Caller-chosen stable identity, shared across reconnects
    pub client_id: String,
    /// Per-process identity distinguishing concurrent connections
    pub instance_id: Uuid,
    /// Commands in queue order
    pub commands: Vec<Command>,
}

impl RpcRequest {
    /// Create a request for one batch.
    #[must_use]
    pub fn new(client_id: impl Into<String>, instance_id: Uuid, commands: Vec<Command>) -> Self {
        Self {
            client_id: client_id.into(),
            instance_id,
            commands,
        }
    }

    /// Serialize to the UTF-8 JSON request body.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Serialize(e.to_string()))
    }

    /// Deserialize from a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_json(body: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(body).map_err(|e| ProtoError::Deserialize(e.to_string()))
    }
}

/// Per-command outcome, positionally matched to the request's commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Server verdict; absent means the server made no decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl CommandResponse {
    /// A response carrying the given result value.
    #[must_use]
    pub fn with_result(result: impl Into<String>) -> Self {
        Self {
            result: Some(result.into()),
        }
    }

    /// Whether this command must be re-queued.
    ///
    /// A missing result or an explicit `"retry"` is retryable; any other
    /// value is terminal success and the command is dropped.
    #[must_use]
    pub fn requests_retry(&self) -> bool {
        matches!(self.result.as_deref(), None | Some("retry"))
    }
}

/// One batched response.
///
/// `events` stays undecoded here; each entry is converted with
/// [`ServerEvent::from_value`] so one malformed event cannot poison the
/// rest of the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Server-assigned session identity, echoed on every exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Per-command results; absent when the server could not process the batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<CommandResponse>>,
    /// Server-pushed events
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<serde_json::Value>,
}

impl RpcResponse {
    /// Serialize to a JSON response body.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Serialize(e.to_string()))
    }

    /// Deserialize from a JSON response body.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not well-formed per the wire contract.
    pub fn from_json(body: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(body).map_err(|e| ProtoError::Deserialize(e.to_string()))
    }
}

/// A server-pushed event, tagged by `event_type`.
///
/// `message` is the only recognized type; decoding an unrecognized type
/// fails and the caller logs and skips that entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum ServerEvent {
    /// An inbound message on a subscribed subject
    #[serde(rename = "message")]
    Message(MessageEvent),
}

/// Payload of a `message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Subject the message belongs to
    pub subject: Subject,
    /// Server-assigned message id
    pub id: u64,
    /// Opaque encoded payload
    pub message: String,
    /// Sender-chosen idempotency id, when the server echoes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_message_id: Option<String>,
}

impl ServerEvent {
    /// Decode a single event entry.
    ///
    /// # Errors
    ///
    /// Returns error for an unrecognized `event_type` or a `message` event
    /// missing its required fields.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ProtoError> {
        serde_json::from_value(value.clone()).map_err(|e| ProtoError::Deserialize(e.to_string()))
    }
}

impl MessageEvent {
    /// Convert into the store's message type.
    #[must_use]
    pub fn into_message(self) -> Message {
        Message {
            id: self.id,
            subject: self.subject,
            payload: self.message,
            sender_message_id: self.sender_message_id,
        }
    }
}

/// Errors for wire serialization/deserialization.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProtoError {
    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// Deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let instance_id = Uuid::new_v4();
        let request = RpcRequest::new(
            "client-1",
            instance_id,
            vec![Command::subscribe(Subject::new("room1"), None, Some(4))],
        );

        let value: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "client_id": "client-1",
                "instance_id": instance_id.to_string(),
                "commands": [
                    {"command": "subscribe", "arguments": {"subject": {"name": "room1"}, "last_id": 4}}
                ]
            })
        );
    }

    #[test]
    fn response_with_all_fields() {
        let body = r#"{
            "profile": "p-1",
            "responses": [{"result": "ok"}, {"result": "retry"}, {}],
            "events": [{"event_type": "message", "subject": {"name": "room1"}, "id": 1, "message": "\"hi\""}]
        }"#;

        let response = RpcResponse::from_json(body).unwrap();
        assert_eq!(response.profile.as_deref(), Some("p-1"));

        let responses = response.responses.unwrap();
        assert!(!responses[0].requests_retry());
        assert!(responses[1].requests_retry());
        assert!(responses[2].requests_retry());
        assert_eq!(response.events.len(), 1);
    }

    #[test]
    fn response_missing_responses_key() {
        let response = RpcResponse::from_json(r#"{"profile": "p-1"}"#).unwrap();
        assert!(response.responses.is_none());
        assert!(response.events.is_empty());
    }

    #[test]
    fn non_retry_result_is_terminal_success() {
        assert!(!CommandResponse::with_result("ok").requests_retry());
        assert!(!CommandResponse::with_result("duplicate_message").requests_retry());
        assert!(CommandResponse::with_result("retry").requests_retry());
        assert!(CommandResponse::default().requests_retry());
    }

    #[test]
    fn message_event_decodes() {
        let value = json!({
            "event_type": "message",
            "subject": {"name": "room1"},
            "id": 7,
            "message": "\"hi\"",
            "sender_message_id": "a-b-c"
        });

        let ServerEvent::Message(event) = ServerEvent::from_value(&value).unwrap();
        let message = event.into_message();
        assert_eq!(message.id, 7);
        assert_eq!(message.subject, Subject::new("room1"));
        assert_eq!(message.payload, "\"hi\"");
        assert_eq!(message.sender_message_id.as_deref(), Some("a-b-c"));
    }

    #[test]
    fn unrecognized_event_type_fails_decode() {
        let value = json!({"event_type": "presence", "subject": {"name": "room1"}});
        assert!(ServerEvent::from_value(&value).is_err());
    }

    #[test]
    fn message_event_missing_id_fails_decode() {
        let value = json!({"event_type": "message", "subject": {"name": "room1"}, "message": "x"});
        assert!(ServerEvent::from_value(&value).is_err());
    }

    #[test]
    fn undecodable_body_is_an_error() {
        assert!(RpcResponse::from_json("not json").is_err());
    }
}
