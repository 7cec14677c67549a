//! Dataset retrieval for Blogshelf.
//!
//! A [`FetchSource`] produces the raw dataset body. [`HttpFetchSource`] issues a
//! GET against the configured URL; [`StaticFetchSource`] answers from memory and
//! is what the offline demo and the tests use.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::types::errors::FetchError;

/// Capability returning the post dataset as a JSON text body.
pub trait FetchSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

// === HttpFetchSource ===

/// Fetches the dataset over HTTP(S).
#[cfg(feature = "network")]
pub struct HttpFetchSource {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "network")]
impl HttpFetchSource {
    /// Builds a client whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "network")]
impl FetchSource for HttpFetchSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::InvalidBody(e.to_string()))
    }
}

// === StaticFetchSource ===

/// Canned answer of a [`StaticFetchSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticResponse {
    Body(String),
    Status(u16),
    NetworkFailure(String),
    Timeout,
}

/// Answers every fetch with the same response, optionally after a delay.
pub struct StaticFetchSource {
    response: StaticResponse,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticFetchSource {
    pub fn new(response: StaticResponse) -> Self {
        Self {
            response,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self::new(StaticResponse::Body(body.into()))
    }

    /// A source whose every request fails at the transport level.
    pub fn offline() -> Self {
        Self::new(StaticResponse::NetworkFailure("offline".to_string()))
    }

    /// Waits `delay` before answering. Lets callers observe an in-flight load.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FetchSource for StaticFetchSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.response {
            StaticResponse::Body(body) => Ok(body.clone()),
            StaticResponse::Status(code) => Err(FetchError::Status(*code)),
            StaticResponse::NetworkFailure(msg) => Err(FetchError::Network(msg.clone())),
            StaticResponse::Timeout => Err(FetchError::Timeout),
        }
    }
}
