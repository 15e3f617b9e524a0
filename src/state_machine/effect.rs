//! Effects produced by state transitions

use super::state::Generation;
use crate::protocol::ChatRequest;

/// Work the session must carry out after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a reply stream tagged with `generation`
    OpenStream {
        generation: Generation,
        request: ChatRequest,
    },

    /// Close the stream of `generation` if it is still open
    CloseStream { generation: Generation },

    /// The message list or a message's content changed
    NotifyMessages,

    /// The session status changed
    NotifyStatus,
}

impl Effect {
    pub fn opens_stream(&self) -> bool {
        matches!(self, Effect::OpenStream { .. })
    }
}
