//! Session state types

use super::conversation::{Conversation, Message, MessageStatus};
use serde::Serialize;
use std::fmt;

/// Tag identifying one stream lifetime. Advances on every submission and
/// every cancellation; events carrying an older tag are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Ready for input
    #[default]
    Idle,
    /// Reply accepted, no fragment yet
    Thinking,
    /// Fragments are arriving
    Streaming,
    /// The last reply failed
    Error { reason: String },
}

impl SessionStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionStatus::Thinking | SessionStatus::Streaming)
    }
}

/// Conversation plus the bookkeeping for the reply in flight
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub(super) conversation: Conversation,
    pub(super) generation: Generation,
    /// Id of the assistant message receiving the current stream
    pub(super) in_flight: Option<String>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Generation of the most recent stream
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The assistant message receiving the current stream
    pub fn in_flight_message(&self) -> Option<&Message> {
        self.in_flight
            .as_deref()
            .and_then(|id| self.conversation.get(id))
    }

    /// Derived from the conversation: the in-flight message if there is one,
    /// otherwise whether the last reply failed. A cancelled reply is not an
    /// error.
    pub fn status(&self) -> SessionStatus {
        if let Some(message) = self.in_flight_message() {
            return match message.status() {
                MessageStatus::Pending => SessionStatus::Thinking,
                _ => SessionStatus::Streaming,
            };
        }
        match self.conversation.last() {
            Some(last) if !last.is_cancelled() => match last.error_reason() {
                Some(reason) => SessionStatus::Error {
                    reason: reason.to_string(),
                },
                None => SessionStatus::Idle,
            },
            _ => SessionStatus::Idle,
        }
    }
}
