//! Subjects: named topics with optional access restrictions.

use serde::{Deserialize, Serialize};

/// A named topic, optionally restricted to a single reading or writing
/// principal.
///
/// Subjects compare by structural equality: two values with the same name
/// and the same restrictions denote the same topic, and the subscription
/// store keys on that equality rather than on object identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Topic name
    pub name: String,
    /// Restrict reads to this principal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readable_only_by: Option<String>,
    /// Restrict writes to this principal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writeable_only_by: Option<String>,
}

impl Subject {
    /// Create an unrestricted subject.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readable_only_by: None,
            writeable_only_by: None,
        }
    }

    /// Restrict reads to the given principal.
    #[must_use]
    pub fn readable_only_by(mut self, principal: impl Into<String>) -> Self {
        self.readable_only_by = Some(principal.into());
        self
    }

    /// Restrict writes to the given principal.
    #[must_use]
    pub fn writeable_only_by(mut self, principal: impl Into<String>) -> Self {
        self.writeable_only_by = Some(principal.into());
        self
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
