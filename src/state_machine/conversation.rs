//! Messages and the ordered conversation that holds them

use crate::protocol::{HistoryEntry, Role, CANCELLED_REASON};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of a message. User messages are always `Complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageStatus {
    /// Accepted, no fragment received yet
    Pending,
    /// At least one fragment received
    Streaming,
    Complete,
    Errored { reason: String },
}

impl MessageStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, MessageStatus::Pending | MessageStatus::Streaming)
    }

    /// Content of a final message never changes again
    pub fn is_final(&self) -> bool {
        !self.is_in_flight()
    }
}

/// One entry in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    id: String,
    role: Role,
    content: String,
    status: MessageStatus,
    /// Display only; ordering is by position in the conversation
    created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), MessageStatus::Complete)
    }

    pub(crate) fn assistant() -> Self {
        Self::new(Role::Assistant, String::new(), MessageStatus::Pending)
    }

    fn new(role: Role, content: String, status: MessageStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> &MessageStatus {
        &self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reason the message ended in error, if it did
    pub fn error_reason(&self) -> Option<&str> {
        match &self.status {
            MessageStatus::Errored { reason } => Some(reason),
            _ => None,
        }
    }

    /// Errored because the user cancelled rather than a genuine failure
    pub fn is_cancelled(&self) -> bool {
        self.error_reason() == Some(CANCELLED_REASON)
    }

    /// Append a fragment. Returns false, leaving the message untouched, once
    /// it is final.
    pub(crate) fn append(&mut self, text: &str) -> bool {
        if self.status.is_final() {
            return false;
        }
        self.content.push_str(text);
        self.status = MessageStatus::Streaming;
        true
    }

    pub(crate) fn complete(&mut self) -> bool {
        if self.status.is_final() {
            return false;
        }
        self.status = MessageStatus::Complete;
        true
    }

    /// Fail the message, keeping whatever content already arrived
    pub(crate) fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_final() {
            return false;
        }
        self.status = MessageStatus::Errored {
            reason: reason.into(),
        };
        true
    }
}

/// Ordered list of messages. Insertion order is significant and ids are
/// unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// The message still receiving fragments, if any
    pub fn in_flight(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.status.is_in_flight())
    }

    /// Completed turns, in order, as re-sent with the next submission.
    /// Errored and cancelled replies are left out.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| m.status == MessageStatus::Complete)
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub(crate) fn push(&mut self, message: Message) {
        debug_assert!(self.get(&message.id).is_none(), "duplicate message id");
        self.messages.push(message);
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}
