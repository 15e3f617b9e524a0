//! `chat_stream` - streaming chat delivery
//!
//! A producer streams a reply as text fragments over a server-sent event
//! stream. On the client, a consumer decodes the stream into events, a pure
//! state machine accumulates them into the conversation, and a session
//! controller ties user actions, streams and observers together.

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod api;
pub mod config;
pub mod consumer;
pub mod producer;
pub mod protocol;
pub mod session;
pub mod state_machine;
