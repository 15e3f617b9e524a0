//! Mock collaborators for session tests
//!
//! These mocks drive a session without a network.

use crate::consumer::{ByteStream, StreamOpener, TransportError};
use crate::protocol::ChatRequest;
use crate::state_machine::{Conversation, MessageStatus, SessionStatus};
use crate::session::SessionObserver;
use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type Chunk = Result<Vec<u8>, TransportError>;

// ============================================================================
// Scripted Opener
// ============================================================================

/// Opener that replays queued scripts, one per `open` call
#[derive(Default)]
pub struct ScriptedOpener {
    scripts: Mutex<VecDeque<Result<Vec<Chunk>, TransportError>>>,
    /// Record of every request opened
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a body delivered as the given reads
    pub fn queue_chunks(&self, chunks: &[&str]) -> &Self {
        let chunks = chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        self.scripts.lock().unwrap().push_back(Ok(chunks));
        self
    }

    /// Queue a body whose reads may fail
    pub fn queue_reads(&self, reads: Vec<Chunk>) -> &Self {
        self.scripts.lock().unwrap().push_back(Ok(reads));
        self
    }

    /// Queue a failure to open
    pub fn queue_error(&self, error: TransportError) -> &Self {
        self.scripts.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamOpener for ScriptedOpener {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock stream queued")))?;
        Ok(stream::iter(script).boxed())
    }
}

// ============================================================================
// Channel Opener
// ============================================================================

/// Opener whose streams are fed by the test, one sender per `open` call
#[derive(Default)]
pub struct ChannelOpener {
    senders: Mutex<Vec<mpsc::UnboundedSender<Chunk>>>,
}

impl ChannelOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    /// Wait until the `index`th stream has been opened and return its feed
    pub async fn sender(&self, index: usize) -> mpsc::UnboundedSender<Chunk> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(sender) = self.senders.lock().unwrap().get(index).cloned() {
                    return sender;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("stream was never opened")
    }
}

#[async_trait]
impl StreamOpener for ChannelOpener {
    async fn open(&self, _request: &ChatRequest) -> Result<ByteStream, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

/// Send one read's worth of text on a channel opener's feed
pub fn feed(sender: &mpsc::UnboundedSender<Chunk>, text: &str) {
    let _ = sender.send(Ok(text.as_bytes().to_vec()));
}

// ============================================================================
// Recording Observer
// ============================================================================

/// Observer that records every notification
#[derive(Debug, Default)]
pub struct RecordingObserver {
    /// Content of the last message at each messages notification
    pub snapshots: Vec<Option<(String, MessageStatus)>>,
    pub statuses: Vec<SessionStatus>,
    pub scrolls: usize,
}

impl SessionObserver for RecordingObserver {
    fn on_messages_changed(&mut self, conversation: &Conversation) {
        self.snapshots.push(
            conversation
                .last()
                .map(|m| (m.content().to_string(), m.status().clone())),
        );
    }

    fn on_status_changed(&mut self, status: &SessionStatus) {
        self.statuses.push(status.clone());
    }

    fn on_scroll_to_latest(&mut self) {
        self.scrolls += 1;
    }
}
