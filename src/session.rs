//! Session controller
//!
//! Mediates user actions against the state machine and runs the effects it
//! returns. The session is the only writer of conversation state and the
//! only owner of the open stream handle.

mod handle;
mod observer;

#[cfg(test)]
pub(crate) mod testing;


pub use observer::{NoopObserver, SessionObserver};

use crate::consumer::{consume, Delivery, StreamOpener};
use crate::protocol::{ChatRequest, DEFAULT_MAX_FRAME_BYTES};
use crate::state_machine::{ChatState, Conversation, Effect, Generation, SessionError, SessionStatus};
use handle::StreamHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the channel between stream tasks and the session
const EVENT_BUFFER: usize = 64;

/// One conversation and at most one reply stream
pub struct Session<O, U = NoopObserver>
where
    O: StreamOpener + 'static,
    U: SessionObserver,
{
    state: ChatState,
    opener: Arc<O>,
    observer: U,
    /// Handle of the stream feeding the in-flight reply
    stream: Option<StreamHandle>,
    event_tx: mpsc::Sender<Delivery>,
    event_rx: mpsc::Receiver<Delivery>,
    max_frame_bytes: usize,
}

impl<O, U> Session<O, U>
where
    O: StreamOpener + 'static,
    U: SessionObserver,
{
    pub fn new(opener: O, observer: U) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            state: ChatState::new(),
            opener: Arc::new(opener),
            observer,
            stream: None,
            event_tx,
            event_rx,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Set the largest frame the decoder accepts
    #[must_use]
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn conversation(&self) -> &Conversation {
        self.state.conversation()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.is_in_flight()
    }

    pub fn observer(&self) -> &U {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut U {
        &mut self.observer
    }

    /// Submit a user message. The stream is opened in the background, so
    /// this never waits on the network.
    pub fn submit(&mut self, text: &str) -> Result<(), SessionError> {
        let effects = self.state.submit(text)?;
        self.execute(effects);
        Ok(())
    }

    /// Cancel the in-flight reply. A no-op when nothing is in flight.
    pub fn cancel(&mut self) {
        let effects = self.state.cancel();
        if !effects.is_empty() {
            tracing::info!(generation = %self.state.generation(), "Reply cancelled");
        }
        self.execute(effects);
    }

    /// Empty the conversation
    pub fn clear(&mut self) -> Result<(), SessionError> {
        let effects = self.state.clear()?;
        self.execute(effects);
        Ok(())
    }

    /// Apply one delivery. Returns whether it changed anything; stale
    /// deliveries are dropped here.
    pub fn apply(&mut self, delivery: Delivery) -> bool {
        let effects = self.state.apply_event(delivery.generation, delivery.event);
        let applied = !effects.is_empty();
        self.execute(effects);
        if applied {
            self.observer.on_scroll_to_latest();
        }
        applied
    }

    /// Wait for the next delivery and apply it. Returns `None` without
    /// waiting when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<Delivery> {
        if !self.state.is_in_flight() {
            return None;
        }
        let delivery = self.event_rx.recv().await?;
        self.apply(delivery.clone());
        Some(delivery)
    }

    /// Drive deliveries until the in-flight reply reaches a final state
    pub async fn wait_idle(&mut self) {
        while self.next_event().await.is_some() {}
    }

    /// Like [`Session::wait_idle`], but cancels the reply if it is still in
    /// flight after `timeout`. Returns `false` when the reply was cancelled.
    pub async fn wait_idle_or_cancel(&mut self, timeout: Duration) -> bool {
        if tokio::time::timeout(timeout, self.wait_idle()).await.is_ok() {
            return true;
        }
        tracing::warn!(?timeout, "Reply timed out");
        self.cancel();
        false
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenStream {
                    generation,
                    request,
                } => self.open_stream(generation, request),
                Effect::CloseStream { generation } => self.close_stream(generation),
                Effect::NotifyMessages => {
                    self.observer.on_messages_changed(self.state.conversation());
                }
                Effect::NotifyStatus => {
                    let status = self.state.status();
                    self.observer.on_status_changed(&status);
                }
            }
        }
    }

    fn open_stream(&mut self, generation: Generation, request: ChatRequest) {
        if let Some(previous) = self.stream.take() {
            tracing::warn!(generation = %previous.generation(), "Replacing a stream that was still open");
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(consume(
            Arc::clone(&self.opener),
            request,
            generation,
            self.event_tx.clone(),
            cancel.clone(),
            self.max_frame_bytes,
        ));
        tracing::debug!(%generation, "Opened reply stream");
        self.stream = Some(StreamHandle::new(generation, cancel, task));
    }

    fn close_stream(&mut self, generation: Generation) {
        if self
            .stream
            .as_ref()
            .is_some_and(|handle| handle.generation() == generation)
        {
            if let Some(handle) = self.stream.take() {
                handle.close();
            }
        }
    }
}
