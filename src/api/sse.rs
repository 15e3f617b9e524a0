//! Server-Sent Events encoding of reply streams

use crate::protocol::{StreamEvent, DONE_DATA, DONE_EVENT, ERROR_EVENT};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::StreamExt;

/// Interval between keep-alive comment frames
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Wrap a reply's events in an SSE response
pub fn sse_stream<S>(
    events: S,
    keep_alive: Duration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    let frames = events.map(|event| Ok(stream_event_to_axum(event)));

    Sse::new(frames).keep_alive(KeepAlive::new().interval(keep_alive).text("ping"))
}

fn stream_event_to_axum(event: StreamEvent) -> Event {
    match event {
        StreamEvent::Fragment { text } => Event::default().data(normalize_line_breaks(&text)),
        StreamEvent::Done => Event::default().event(DONE_EVENT).data(DONE_DATA),
        StreamEvent::Failed { reason } => Event::default()
            .event(ERROR_EVENT)
            .data(normalize_line_breaks(&reason)),
    }
}

/// Data lines are split on `\n`; a bare `\r` is not allowed in a field, so
/// `\r\n` and `\r` both reach the consumer as `\n`
fn normalize_line_breaks(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}
