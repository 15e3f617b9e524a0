//! Built-in reply sources

use super::{FragmentStream, ProducerError, ReplySource};
use crate::protocol::ChatRequest;
use futures::stream;
use futures::StreamExt;
use std::time::Duration;

/// Words streamed by [`ScriptedReply`]
pub const DEFAULT_WORDS: &[&str] = &["Hello", "this", "is", "a", "streaming", "response"];

/// Streams a fixed reply one word per tick, regardless of the submission
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    words: Vec<String>,
    interval: Duration,
}

impl ScriptedReply {
    pub fn new(interval: Duration) -> Self {
        Self::with_words(DEFAULT_WORDS.iter().copied(), interval)
    }

    pub fn with_words<I, S>(words: I, interval: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            interval,
        }
    }
}

impl ReplySource for ScriptedReply {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn reply(&self, _request: &ChatRequest) -> FragmentStream {
        paced(self.words.clone(), self.interval)
    }
}

/// Streams the user's own message back, word by word
#[derive(Debug, Clone)]
pub struct EchoReply {
    interval: Duration,
}

impl EchoReply {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl ReplySource for EchoReply {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn reply(&self, request: &ChatRequest) -> FragmentStream {
        let words = request
            .message
            .split_whitespace()
            .map(str::to_string)
            .collect();
        paced(words, self.interval)
    }
}

/// One fragment per word, each after `interval`. Words after the first carry
/// their leading space so the fragments concatenate to readable text.
fn paced(words: Vec<String>, interval: Duration) -> FragmentStream {
    stream::iter(words.into_iter().enumerate())
        .then(move |(i, word)| async move {
            tokio::time::sleep(interval).await;
            let text = if i == 0 { word } else { format!(" {word}") };
            Ok::<_, ProducerError>(text)
        })
        .boxed()
}
