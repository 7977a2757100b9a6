//! Client commands pending server acknowledgement.

use msgsync_core::Subject;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client-originated intent not yet confirmed applied by the server.
///
/// Serializes to the wire form `{"command": <name>, "arguments": {...}}`.
/// Commands live in the engine's queue from creation until the server
/// classifies them as applied; retryable commands are re-queued verbatim,
/// except for the subscribe rewrite applied by retry classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "arguments")]
pub enum Command {
    /// Register interest in a subject, optionally replaying history
    #[serde(rename = "subscribe")]
    Subscribe(SubscribeArgs),
    /// Drop interest in a subject
    #[serde(rename = "unsubscribe")]
    Unsubscribe(UnsubscribeArgs),
    /// Publish a message to a subject
    #[serde(rename = "sendMessage")]
    SendMessage(SendMessageArgs),
}

/// Arguments for `subscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeArgs {
    /// Subject to subscribe to
    pub subject: Subject,
    /// How many historical messages to replay, newest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<u64>,
    /// Replay only messages with ids greater than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<u64>,
}

/// Arguments for `unsubscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeArgs {
    /// Subject to drop
    pub subject: Subject,
}

/// Arguments for `sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageArgs {
    /// Subject to publish on
    pub subject: Subject,
    /// Opaque encoded payload
    pub message: String,
    /// Client-chosen id letting the server deduplicate republished sends
    pub sender_message_id: Uuid,
}

impl Command {
    /// Build a subscribe command.
    ///
    /// `messages` and `last_id` are omitted from the wire when unset.
    #[must_use]
    pub fn subscribe(subject: Subject, messages: Option<u64>, last_id: Option<u64>) -> Self {
        Self::Subscribe(SubscribeArgs {
            subject,
            messages,
            last_id,
        })
    }

    /// Build an unsubscribe command.
    #[must_use]
    pub fn unsubscribe(subject: Subject) -> Self {
        Self::Unsubscribe(UnsubscribeArgs { subject })
    }

    /// Build a send-message command.
    #[must_use]
    pub fn send_message(subject: Subject, message: impl Into<String>, sender_message_id: Uuid) -> Self {
        Self::SendMessage(SendMessageArgs {
            subject,
            message: message.into(),
            sender_message_id,
        })
    }

    /// Wire name of the command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Subscribe(_) => "subscribe",
            Self::Unsubscribe(_) => "unsubscribe",
            Self::SendMessage(_) => "sendMessage",
        }
    }

    /// Subject the command targets.
    #[must_use]
    pub fn subject(&self) -> &Subject {
        match self {
            Self::Subscribe(args) => &args.subject,
            Self::Unsubscribe(args) => &args.subject,
            Self::SendMessage(args) => &args.subject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_wire_shape() {
        let command = Command::subscribe(Subject::new("room1"), Some(10), None);
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(
            value,
            json!({
                "command": "subscribe",
                "arguments": {"subject": {"name": "room1"}, "messages": 10}
            })
        );
    }

    #[test]
    fn subscribe_hints_omitted_when_unset() {
        let command = Command::subscribe(Subject::new("room1"), None, None);
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(
            value,
            json!({"command": "subscribe", "arguments": {"subject": {"name": "room1"}}})
        );
    }

    #[test]
    fn send_message_wire_shape() {
        let id = Uuid::new_v4();
        let command = Command::send_message(Subject::new("room1"), "\"hi\"", id);
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(
            value,
            json!({
                "command": "sendMessage",
                "arguments": {
                    "subject": {"name": "room1"},
                    "message": "\"hi\"",
                    "sender_message_id": id.to_string(),
                }
            })
        );
    }

    #[test]
    fn unsubscribe_roundtrip() {
        let command = Command::unsubscribe(Subject::new("room1").writeable_only_by("bob"));
        let value = serde_json::to_value(&command).unwrap();
        let decoded: Command = serde_json::from_value(value).unwrap();
        assert_eq!(command, decoded);
        assert_eq!(decoded.name(), "unsubscribe");
        assert_eq!(decoded.subject().name, "room1");
    }
}
