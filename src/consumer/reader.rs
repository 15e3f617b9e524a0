//! Turns an open byte stream into a finite sequence of events

use super::{ByteStream, StreamOpener, TransportError, TransportErrorKind};
use crate::protocol::{stream_event, ChatRequest, DecodeError, FrameLimit, StreamEvent};
use crate::state_machine::Generation;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// An event tagged with the generation of the stream it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub generation: Generation,
    pub event: StreamEvent,
}

type FrameStream = BoxStream<'static, Result<Event, EventStreamError<TransportError>>>;

struct DecodeState {
    frames: FrameStream,
    finished: bool,
}

/// Decode `bytes` lazily. The returned stream always ends with exactly one
/// terminal event: `Done`, a producer `Failed`, or a `Failed` synthesized
/// from a transport error, a decode error, or a close without a terminal
/// frame. Nothing is read after the terminal event.
pub fn decode_events(bytes: ByteStream, max_frame_bytes: usize) -> BoxStream<'static, StreamEvent> {
    let mut limit = FrameLimit::new(max_frame_bytes);
    let frames = bytes
        .map(move |read| {
            read.and_then(|chunk| {
                limit
                    .check(&chunk)
                    .map(|()| chunk)
                    .map_err(|err| malformed(&err))
            })
        })
        .eventsource()
        .boxed();

    let state = DecodeState {
        frames,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        let failure = loop {
            match state.frames.next().await {
                Some(Ok(frame)) => {
                    if let Some(event) = stream_event(frame) {
                        state.finished = event.is_terminal();
                        return Some((event, state));
                    }
                }
                Some(Err(EventStreamError::Transport(err))) => {
                    if err.kind != TransportErrorKind::Decode {
                        tracing::warn!(error = %err, kind = ?err.kind, "Reply stream read failed");
                    }
                    break err;
                }
                Some(Err(EventStreamError::Utf8(_))) => break malformed(&DecodeError::InvalidUtf8),
                Some(Err(other)) => break malformed(&DecodeError::Malformed(other.to_string())),
                None => {
                    tracing::warn!("Reply stream closed without a terminal event");
                    break TransportError::closed();
                }
            }
        };

        state.finished = true;
        Some((StreamEvent::failed(failure.message), state))
    })
    .boxed()
}

fn malformed(err: &DecodeError) -> TransportError {
    tracing::warn!(error = %err, "Malformed reply stream");
    TransportError::decode(err)
}

/// Body of a stream handle's task: open the channel, then forward decoded
/// events until the terminal one, cancellation, or the session going away.
pub(crate) async fn consume<O>(
    opener: Arc<O>,
    request: ChatRequest,
    generation: Generation,
    tx: mpsc::Sender<Delivery>,
    cancel: CancellationToken,
    max_frame_bytes: usize,
) where
    O: StreamOpener + ?Sized,
{
    let opened = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(%generation, "Stream cancelled before it opened");
            return;
        }
        opened = opener.open(&request) => opened,
    };

    let mut events = match opened {
        Ok(bytes) => decode_events(bytes, max_frame_bytes),
        Err(err) => {
            tracing::warn!(%generation, error = %err, kind = ?err.kind, "Failed to open reply stream");
            stream::once(async move { StreamEvent::failed(err.message) }).boxed()
        }
    };

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(%generation, "Stream cancelled");
                return;
            }
            next = events.next() => next,
        };
        let Some(event) = next else {
            return;
        };

        let delivery = Delivery { generation, event };
        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            sent = tx.send(delivery) => sent,
        };
        if sent.is_err() {
            tracing::debug!(%generation, "Session dropped, stopping stream");
            return;
        }
    }
}
