//! Events carried by a reply stream

/// Event name of the terminal success frame
pub const DONE_EVENT: &str = "done";

/// Payload of the `done` frame. Frames without data are never dispatched
/// by an event stream parser, so the terminal frame carries this marker.
pub const DONE_DATA: &str = "[DONE]";

/// Event name of the terminal failure frame; its data is the reason
pub const ERROR_EVENT: &str = "error";

/// Reason recorded on a reply the user cancelled
pub const CANCELLED_REASON: &str = "cancelled by user";

/// Reason synthesized when the channel closes before a terminal frame
pub const CONNECTION_CLOSED_REASON: &str = "connection closed unexpectedly";

/// One decoded unit of a reply stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text to append to the in-flight assistant message
    Fragment { text: String },
    /// Terminal success; no fragments follow
    Done,
    /// Terminal failure
    Failed { reason: String },
}

impl StreamEvent {
    pub fn fragment(text: impl Into<String>) -> Self {
        StreamEvent::Fragment { text: text.into() }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        StreamEvent::Failed {
            reason: reason.into(),
        }
    }

    /// `Done` and `Failed` end a stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Failed { .. })
    }
}
