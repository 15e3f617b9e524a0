//! Stream consumer
//!
//! Opens a reply stream, decodes its frames and forwards the resulting
//! events, tagged with their generation, to the session.

mod client;
mod error;
mod reader;

#[cfg(test)]
mod proptests;

pub use client::{ApiClient, HttpOpener, API_PREFIX, CHAT_ENDPOINT};
pub use error::{TransportError, TransportErrorKind};
pub use reader::{decode_events, Delivery};

pub(crate) use reader::consume;

use crate::protocol::ChatRequest;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Raw body of an open reply stream, one item per transport read
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Opens the channel for one submission
#[async_trait]
pub trait StreamOpener: Send + Sync {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;
}

#[async_trait]
impl<T: StreamOpener + ?Sized> StreamOpener for Arc<T> {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        (**self).open(request).await
    }
}
