//! Wire protocol between the stream producer and the stream consumer
//!
//! Replies travel as a text event stream over a long-lived HTTP response
//! body. A frame without an `event:` line is a fragment whose `data:` lines
//! carry the literal text; `event: done` and `event: error` end the stream.
//! Both terminal frames carry a `data:` line, since a frame without data
//! is never dispatched.

mod decoder;
mod event;
mod request;

pub use decoder::{
    stream_event, DecodeError, FrameLimit, DEFAULT_ERROR_REASON, DEFAULT_MAX_FRAME_BYTES,
};
pub use event::{
    StreamEvent, CANCELLED_REASON, CONNECTION_CLOSED_REASON, DONE_DATA, DONE_EVENT, ERROR_EVENT,
};
pub use request::{ChatRequest, HistoryEntry, Role};
