//! Inputs that drive state transitions

use super::state::Generation;
use crate::protocol::StreamEvent;

/// Everything that can change a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    // User actions
    Submit { text: String },
    Cancel,
    Clear,

    // Stream delivery
    Stream {
        generation: Generation,
        event: StreamEvent,
    },
}

impl Input {
    pub fn submit(text: impl Into<String>) -> Self {
        Input::Submit { text: text.into() }
    }

    pub fn stream(generation: Generation, event: StreamEvent) -> Self {
        Input::Stream { generation, event }
    }
}
