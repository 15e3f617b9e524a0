//! Mapping of parsed event stream frames onto reply events
//!
//! Line splitting, field parsing and UTF-8 reassembly are done by
//! `eventsource_stream`. This module only gives parsed frames their
//! meaning and bounds how large a single frame may grow.

use super::event::{StreamEvent, DONE_EVENT, ERROR_EVENT};
use eventsource_stream::Event;
use thiserror::Error;

/// Default cap on the size of a single frame
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Reason used when an `error` frame carries no data
pub const DEFAULT_ERROR_REASON: &str = "producer reported an error";

/// Malformed framing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed frame: invalid UTF-8")]
    InvalidUtf8,
    #[error("Malformed frame: exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },
    #[error("Malformed frame: {0}")]
    Malformed(String),
}

/// Interpret one dispatched frame. Frames with an unrecognized event name
/// yield `None` and are skipped by the caller.
pub fn stream_event(frame: Event) -> Option<StreamEvent> {
    match frame.event.as_str() {
        // An empty name means the default `message` type
        "" | "message" => Some(StreamEvent::Fragment { text: frame.data }),
        DONE_EVENT => Some(StreamEvent::Done),
        ERROR_EVENT => Some(StreamEvent::failed(if frame.data.is_empty() {
            DEFAULT_ERROR_REASON.to_string()
        } else {
            frame.data
        })),
        other => {
            tracing::debug!(event = other, "Skipping unrecognized stream event");
            None
        }
    }
}

/// Byte budget for the frame currently being received.
///
/// Field bytes count against the limit; line terminators (`\n`, `\r` or
/// `\r\n`) do not. A blank line ends the frame and resets the count. Feed
/// every read through [`FrameLimit::check`] before it reaches the parser.
#[derive(Debug)]
pub struct FrameLimit {
    max_frame_bytes: usize,
    frame_len: usize,
    line_len: usize,
    /// The last byte seen was `\r`; a following `\n` belongs to it
    after_cr: bool,
}

impl Default for FrameLimit {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameLimit {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            frame_len: 0,
            line_len: 0,
            after_cr: false,
        }
    }

    /// Account for one read
    pub fn check(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        for &byte in chunk {
            let after_cr = std::mem::replace(&mut self.after_cr, false);
            match byte {
                b'\n' if after_cr => {}
                b'\n' | b'\r' => {
                    if self.line_len == 0 {
                        self.frame_len = 0;
                    }
                    self.line_len = 0;
                    self.after_cr = byte == b'\r';
                }
                _ => {
                    self.line_len += 1;
                    self.frame_len += 1;
                    if self.frame_len > self.max_frame_bytes {
                        return Err(DecodeError::FrameTooLarge {
                            limit: self.max_frame_bytes,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
