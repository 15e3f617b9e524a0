//! Transport error types

use crate::protocol::{DecodeError, CONNECTION_CLOSED_REASON};
use reqwest::StatusCode;
use thiserror::Error;

/// Transport failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    /// Non-success response, formatted as `HTTP <code> - <reason>`
    pub fn status(status: StatusCode) -> Self {
        Self::new(
            TransportErrorKind::Status(status.as_u16()),
            format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            ),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidRequest, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidResponse, message)
    }

    pub fn decode(err: &DecodeError) -> Self {
        Self::new(TransportErrorKind::Decode, err.to_string())
    }

    pub fn closed() -> Self {
        Self::new(TransportErrorKind::Closed, CONNECTION_CLOSED_REASON)
    }

    /// Classify a reqwest failure
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("Request timeout: {err}"))
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else if err.is_decode() {
            Self::invalid_response(format!("Failed to read response: {err}"))
        } else {
            Self::network(format!("Request failed: {err}"))
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, reset, timed out
    Network,
    /// Request could not be built
    InvalidRequest,
    /// Server answered with a non-success status
    Status(u16),
    /// Response was not what the protocol expects
    InvalidResponse,
    /// Malformed framing
    Decode,
    /// Channel closed before a terminal frame
    Closed,
}
