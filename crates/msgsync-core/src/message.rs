//! Messages received on a subject.

use crate::subject::Subject;
use serde::{Deserialize, Serialize};

/// A message stored in a subject's local history.
///
/// The `id` is assigned by the server and strictly increases within a
/// subject; the store relies on it for ordering and deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned, monotonically increasing identifier
    pub id: u64,
    /// Subject the message was published on
    pub subject: Subject,
    /// Opaque encoded payload as supplied by the sender
    pub payload: String,
    /// Sender-chosen identifier used for idempotent publishes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_message_id: Option<String>,
}

impl Message {
    /// Create a message without a sender message id.
    #[must_use]
    pub fn new(id: u64, subject: Subject, payload: impl Into<String>) -> Self {
        Self {
            id,
            subject,
            payload: payload.into(),
            sender_message_id: None,
        }
    }

    /// Attach the sender-chosen idempotency id.
    #[must_use]
    pub fn with_sender_message_id(mut self, sender_message_id: impl Into<String>) -> Self {
        self.sender_message_id = Some(sender_message_id.into());
        self
    }
}
