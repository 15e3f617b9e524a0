//! Stream producer
//!
//! A [`ReplySource`] yields the text of a reply as a stream of fragments.
//! [`produce`] drives one source into a stream of [`StreamEvent`]s that
//! always ends with exactly one terminal event.

mod source;

pub use source::{EchoReply, ScriptedReply, DEFAULT_WORDS};

use crate::config::{ReplyMode, ServerConfig};
use crate::protocol::{ChatRequest, StreamEvent};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Capacity of the channel between the emitting task and the response body
const EVENT_BUFFER: usize = 16;

/// Failure while generating a reply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProducerError {
    #[error("reply generation failed: {0}")]
    Generation(String),
}

/// Fragments of one reply, in emission order
pub type FragmentStream = BoxStream<'static, Result<String, ProducerError>>;

/// Source of reply text for a submission
pub trait ReplySource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn reply(&self, request: &ChatRequest) -> FragmentStream;
}

impl<T: ReplySource + ?Sized> ReplySource for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn reply(&self, request: &ChatRequest) -> FragmentStream {
        (**self).reply(request)
    }
}

/// Build the reply source selected by `config`
pub fn reply_source(config: &ServerConfig) -> Arc<dyn ReplySource> {
    match config.reply {
        ReplyMode::Scripted => Arc::new(ScriptedReply::new(config.fragment_interval)),
        ReplyMode::Echo => Arc::new(EchoReply::new(config.fragment_interval)),
    }
}

/// Spawn a task that emits `fragments` followed by one terminal event.
///
/// The task stops as soon as the receiving side goes away, so a client
/// disconnect leaves nothing running.
pub fn produce(mut fragments: FragmentStream) -> ReceiverStream<StreamEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    tokio::spawn(async move {
        let mut sent = 0usize;
        let terminal = loop {
            let next = tokio::select! {
                () = tx.closed() => {
                    tracing::debug!(fragments = sent, "Client disconnected, stopping reply");
                    return;
                }
                next = fragments.next() => next,
            };

            match next {
                Some(Ok(text)) => {
                    if tx.send(StreamEvent::Fragment { text }).await.is_err() {
                        tracing::debug!(fragments = sent, "Client disconnected, stopping reply");
                        return;
                    }
                    sent += 1;
                }
                Some(Err(err)) => {
                    tracing::warn!(error = %err, fragments = sent, "Reply failed mid-stream");
                    break StreamEvent::failed(err.to_string());
                }
                None => break StreamEvent::Done,
            }
        };

        tracing::debug!(fragments = sent, failed = !matches!(terminal, StreamEvent::Done), "Reply finished");
        let _ = tx.send(terminal).await;
    });

    ReceiverStream::new(rx)
}
