//! HTTP API for the stream producer

mod handlers;
mod sse;
mod types;

pub use handlers::{create_router, VERSION};
pub use sse::{sse_stream, KEEP_ALIVE_INTERVAL};
pub use types::{ErrorResponse, HealthResponse};

use crate::config::ServerConfig;
use crate::producer::{reply_source, ReplySource};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ReplySource>,
    pub keep_alive: Duration,
}

impl AppState {
    pub fn new(source: Arc<dyn ReplySource>) -> Self {
        Self {
            source,
            keep_alive: KEEP_ALIVE_INTERVAL,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(reply_source(config))
    }

    #[must_use]
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }
}
