//! State transitions
//!
//! Every input is validated before anything is mutated, so a rejected
//! input leaves the state exactly as it was.

use super::conversation::Message;
use super::{ChatState, Effect, Generation, Input};
use crate::protocol::{ChatRequest, StreamEvent, CANCELLED_REASON};
use thiserror::Error;

/// Why a submission was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still in flight (cancel it first)")]
    ReplyInFlight,
}

/// Errors returned synchronously from user actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    Validation(Rejection),
    #[error("Invalid operation: {0}")]
    InvalidOperation(&'static str),
}

impl ChatState {
    /// Apply one input and return the effects to execute
    pub fn transition(&mut self, input: Input) -> Result<Vec<Effect>, SessionError> {
        let status_before = self.status();

        let mut effects = match input {
            Input::Submit { text } => self.on_submit(&text)?,
            Input::Cancel => self.on_cancel(),
            Input::Clear => self.on_clear()?,
            Input::Stream { generation, event } => self.on_stream_event(generation, event),
        };

        if self.status() != status_before {
            effects.push(Effect::NotifyStatus);
        }
        Ok(effects)
    }

    /// Accept a user message and request a new stream
    pub fn submit(&mut self, text: &str) -> Result<Vec<Effect>, SessionError> {
        self.transition(Input::submit(text))
    }

    /// Apply a delivered event. Stale generations and events arriving after
    /// the terminal one produce no effects.
    pub fn apply_event(&mut self, generation: Generation, event: StreamEvent) -> Vec<Effect> {
        self.transition(Input::stream(generation, event))
            .unwrap_or_default()
    }

    /// Cancel the reply in flight, if any
    pub fn cancel(&mut self) -> Vec<Effect> {
        self.transition(Input::Cancel).unwrap_or_default()
    }

    /// Empty the conversation; refused while a reply is in flight
    pub fn clear(&mut self) -> Result<Vec<Effect>, SessionError> {
        self.transition(Input::Clear)
    }

    fn on_submit(&mut self, text: &str) -> Result<Vec<Effect>, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::Validation(Rejection::EmptyMessage));
        }
        if self.in_flight.is_some() {
            return Err(SessionError::Validation(Rejection::ReplyInFlight));
        }

        let request = ChatRequest::new(text).with_history(self.conversation.history());
        let reply = Message::assistant();

        self.in_flight = Some(reply.id().to_string());
        self.conversation.push(Message::user(text));
        self.conversation.push(reply);
        self.generation = self.generation.next();

        Ok(vec![
            Effect::NotifyMessages,
            Effect::OpenStream {
                generation: self.generation,
                request,
            },
        ])
    }

    fn on_stream_event(&mut self, generation: Generation, event: StreamEvent) -> Vec<Effect> {
        if generation != self.generation {
            tracing::trace!(%generation, current = %self.generation, "Discarding stale stream event");
            return vec![];
        }
        let Some(id) = self.in_flight.clone() else {
            return vec![];
        };
        let Some(message) = self.conversation.get_mut(&id) else {
            self.in_flight = None;
            return vec![];
        };

        match event {
            StreamEvent::Fragment { text } => {
                message.append(&text);
                vec![Effect::NotifyMessages]
            }
            StreamEvent::Done => {
                message.complete();
                self.in_flight = None;
                vec![Effect::NotifyMessages, Effect::CloseStream { generation }]
            }
            StreamEvent::Failed { reason } => {
                tracing::debug!(%generation, %reason, "Reply failed");
                message.fail(reason);
                self.in_flight = None;
                vec![Effect::NotifyMessages, Effect::CloseStream { generation }]
            }
        }
    }

    fn on_cancel(&mut self) -> Vec<Effect> {
        let Some(id) = self.in_flight.take() else {
            return vec![];
        };
        if let Some(message) = self.conversation.get_mut(&id) {
            message.fail(CANCELLED_REASON);
        }

        let closing = self.generation;
        self.generation = self.generation.next();

        vec![
            Effect::CloseStream {
                generation: closing,
            },
            Effect::NotifyMessages,
        ]
    }

    fn on_clear(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::InvalidOperation(
                "cannot clear while a reply is in flight (cancel it first)",
            ));
        }
        if self.conversation.is_empty() {
            return Ok(vec![]);
        }
        self.conversation.clear();
        Ok(vec![Effect::NotifyMessages])
    }
}
