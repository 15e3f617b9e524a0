//! HTTP client for the producer's API
//!
//! Endpoints are resolved under [`API_PREFIX`]. The client only opens
//! streams and fetches small JSON documents; retries belong to the caller.

use super::{ByteStream, StreamOpener, TransportError};
use crate::protocol::ChatRequest;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Prefix shared by every API endpoint
pub const API_PREFIX: &str = "/api";

/// Endpoint that accepts a submission and answers with a reply stream
pub const CHAT_ENDPOINT: &str = "/chat";

const EVENT_STREAM: &str = "text/event-stream";
const JSON: &str = "application/json";

/// Thin wrapper over `reqwest` with the API's URL and error conventions
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `endpoint` under the API prefix, adding the leading slash
    /// when missing, and append URL-encoded query parameters.
    pub fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, TransportError> {
        let separator = if endpoint.starts_with('/') { "" } else { "/" };
        let raw = format!("{}{API_PREFIX}{separator}{endpoint}", self.base_url);
        let mut url = Url::parse(&raw)
            .map_err(|e| TransportError::invalid_request(format!("Invalid URL {raw}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// GET a JSON document
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        let response = self
            .http
            .get(self.url(endpoint, params)?)
            .header(CONTENT_TYPE, JSON)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        check_status(response)?
            .json::<T>()
            .await
            .map_err(|e| TransportError::invalid_response(format!("Failed to parse response: {e}")))
    }

    /// POST `body` as JSON and hand back the event stream body unread
    pub async fn open_stream<B>(&self, endpoint: &str, body: &B) -> Result<ByteStream, TransportError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let response = self
            .http
            .post(self.url(endpoint, &[])?)
            .header(ACCEPT, EVENT_STREAM)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        let response = check_status(response)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with(EVENT_STREAM) {
            return Err(TransportError::invalid_response(format!(
                "Expected {EVENT_STREAM} response, got '{content_type}'"
            )));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::from_reqwest(&e))
            })
            .boxed())
    }
}

fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TransportError::status(status))
    }
}

/// Production [`StreamOpener`]: one `POST /api/chat` per submission
#[derive(Debug, Clone)]
pub struct HttpOpener {
    client: ApiClient,
    endpoint: String,
}

impl HttpOpener {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            endpoint: CHAT_ENDPOINT.to_string(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl StreamOpener for HttpOpener {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        tracing::debug!(
            base_url = %self.client.base_url(),
            endpoint = %self.endpoint,
            history = request.history.len(),
            "Opening reply stream"
        );
        self.client.open_stream(&self.endpoint, request).await
    }
}
