//! Per-subject ordered, deduplicated message history.

use crate::message::Message;
use crate::subject::Subject;

/// A client-side registration for a subject plus its locally cached
/// message history, ordered by ascending message id.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// The subject this subscription covers
    pub subject: Subject,
    /// Locally cached history, strictly increasing by id
    pub messages: Vec<Message>,
}

impl Subscription {
    fn new(subject: Subject) -> Self {
        Self {
            subject,
            messages: Vec::new(),
        }
    }
}

/// Result of offering a message to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The message was new and spliced into order
    Inserted,
    /// A message with the same id is already stored; the insert was a no-op
    Duplicate,
    /// No subscription exists for the subject; the message was dropped
    UnknownSubject,
}

/// Registry of subscriptions, keyed by subject structural equality.
///
/// Subscription counts are small, so lookup is a linear scan. All methods
/// returning messages return independent copies; later store mutation never
/// aliases into a caller's snapshot.
#[derive(Debug, Default)]
pub struct SubscriptionStore {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, subject: &Subject) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| &s.subject == subject)
    }

    fn find_mut(&mut self, subject: &Subject) -> Option<&mut Subscription> {
        self.subscriptions
            .iter_mut()
            .find(|s| &s.subject == subject)
    }

    /// Ensure a subscription exists for `subject`.
    ///
    /// Returns true if a new entry was created. A second call with a
    /// structurally equal subject reuses the existing entry, so at most one
    /// subscription exists per distinct subject value.
    pub fn subscribe(&mut self, subject: &Subject) -> bool {
        if self.find(subject).is_some() {
            return false;
        }
        self.subscriptions.push(Subscription::new(subject.clone()));
        true
    }

    /// Remove the subscription for `subject`, if any.
    ///
    /// Returns true if an entry was removed.
    pub fn unsubscribe(&mut self, subject: &Subject) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| &s.subject != subject);
        self.subscriptions.len() != before
    }

    /// Splice a message into its subject's history, preserving strictly
    /// increasing id order.
    ///
    /// Scans backward from the newest entry: received messages are almost
    /// always newer than everything stored. A message whose id is already
    /// present is dropped.
    pub fn insert_message(&mut self, message: Message) -> InsertOutcome {
        let Some(subscription) = self.find_mut(&message.subject) else {
            tracing::warn!(subject = %message.subject, id = message.id, "message for unknown subject dropped");
            return InsertOutcome::UnknownSubject;
        };

        let mut insert_at = subscription.messages.len();
        for (index, stored) in subscription.messages.iter().enumerate().rev() {
            if stored.id == message.id {
                return InsertOutcome::Duplicate;
            }
            if stored.id < message.id {
                break;
            }
            insert_at = index;
        }
        subscription.messages.insert(insert_at, message);
        InsertOutcome::Inserted
    }

    /// Copy of all stored messages for `subject`, oldest first.
    ///
    /// Empty when the subject has no subscription.
    #[must_use]
    pub fn messages(&self, subject: &Subject) -> Vec<Message> {
        self.find(subject)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Copy of the highest-id message for `subject`, if any.
    #[must_use]
    pub fn last_message(&self, subject: &Subject) -> Option<Message> {
        self.find(subject).and_then(|s| s.messages.last().cloned())
    }

    /// Whether a subscription exists for `subject`.
    #[must_use]
    pub fn contains(&self, subject: &Subject) -> bool {
        self.find(subject).is_some()
    }

    /// Number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the store holds no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
