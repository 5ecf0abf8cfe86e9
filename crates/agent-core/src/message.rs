//! Conversation Messages
//!
//! Standard message format used across the agent system, and the append-only
//! conversation log that every loop iteration reads from and writes to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::ToolCall;

/// Role of a message sender
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool observation (injected as context)
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Identity key; an append with a matching id replaces the entry in place
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Tool invocations requested by the model; non-empty only for Assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Optional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// Additional message metadata
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Correlation id of the request this observation answers (tool messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Model that generated this (assistant messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message with no pending tool calls
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool-call requests
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a tool observation message correlated to a request
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.metadata = Some(MessageMetadata {
            tool_call_id: Some(tool_call_id.into()),
            ..Default::default()
        });
        msg
    }

    /// Record the model that produced this message
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(MessageMetadata::default)
            .model = Some(model.into());
        self
    }

    /// Correlation id, for tool messages
    pub fn tool_call_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.tool_call_id.as_deref()
    }
}

/// Ordered conversation history.
///
/// The sequence only ever grows: messages are appended, never reordered or
/// removed. The one exception is identity-keyed replacement — appending a
/// message whose `id` is already present updates that entry in place, which
/// is how fanned-out observation batches accumulate. Context-window trimming
/// is an external policy and has no surface here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, or replace the entry sharing its id
    pub fn append(&mut self, message: Message) {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *existing = message;
        } else {
            self.messages.push(message);
        }
    }

    /// Append a batch of messages in one call, so a reader never observes a
    /// partial batch
    pub fn append_batch(&mut self, batch: impl IntoIterator<Item = Message>) {
        for message in batch {
            self.append(message);
        }
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn test_tool_message_carries_correlation_id() {
        let msg = Message::tool("{\"result\":5}", "call_1");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id(), Some("call_1"));
    }

    #[test]
    fn test_append_preserves_order() {
        let mut conv = Conversation::new();
        conv.append(Message::user("Hi"));
        conv.append(Message::assistant("Hello!"));

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].role, Role::User);
        assert_eq!(conv.last().map(|m| &m.role), Some(&Role::Assistant));
    }

    #[test]
    fn test_append_replaces_by_id() {
        let mut conv = Conversation::new();
        let first = Message::assistant("partial");
        let id = first.id;
        conv.append(Message::user("Hi"));
        conv.append(first);

        let mut updated = Message::assistant("complete");
        updated.id = id;
        conv.append(updated);

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[1].content, "complete");
    }

    #[test]
    fn test_batch_append_round_trip() {
        let mut conv = Conversation::new();
        conv.append(Message::user("question"));

        let batch = vec![
            Message::tool("{\"result\":1}", "a"),
            Message::tool("{\"result\":2}", "b"),
            Message::tool("{\"result\":3}", "c"),
        ];
        let ids: Vec<_> = batch.iter().map(|m| m.id).collect();
        conv.append_batch(batch);

        let tail = &conv.messages()[1..];
        assert_eq!(tail.len(), 3);
        for (message, id) in tail.iter().zip(ids) {
            assert_eq!(message.id, id);
        }
    }
}
