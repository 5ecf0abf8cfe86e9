//! Session Management
//!
//! A session wraps one conversation for a sequence of interactive turns.
//! Sessions are never shared across concurrent turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Conversation, Role};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An interactive agent session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            conversation: Conversation::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Derive a title from the first user message
    pub fn title(&self) -> String {
        self.conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| {
                let preview: String = m.content.chars().take(50).collect();
                if m.content.chars().count() > 50 {
                    format!("{}...", preview)
                } else {
                    preview
                }
            })
            .unwrap_or_else(|| format!("Session {}", &self.id.as_str()[..8]))
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert_eq!(session.message_count(), 0);
        assert!(session.title().starts_with("Session "));
    }

    #[test]
    fn test_title_previews_first_user_message() {
        let mut session = Session::new();
        session.conversation.append(Message::user("What is 2 + 3?"));
        session.conversation.append(Message::assistant("5"));
        assert_eq!(session.title(), "What is 2 + 3?");
    }

    #[test]
    fn test_title_truncates_long_input() {
        let mut session = Session::new();
        session.conversation.append(Message::user("x".repeat(80)));
        assert!(session.title().ends_with("..."));
        assert_eq!(session.title().chars().count(), 53);
    }
}
