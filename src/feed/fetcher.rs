//! HTTP retrieval of feed documents.
//!
//! A fetch is a single attempt: one GET with a fixed User-Agent, bounded
//! by the caller's deadline, no retries. Scheduling policy lives in the
//! aggregator; this module only reports what happened.

use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// User-Agent sent with every request so feed operators can identify us.
pub const USER_AGENT: &str = concat!("sift/", env!("CARGO_PKG_VERSION"));

/// Maximum redirect hops before a fetch is abandoned.
const MAX_REDIRECTS: usize = 5;

/// Response bodies larger than this are rejected outright.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching a feed document.
///
/// Exactly one of these is produced per attempt. There is no retry
/// classification because the fetcher never retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error before any body bytes arrived (DNS, connection, TLS)
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The request did not complete within the caller's deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// HTTP response with a non-2xx status code
    #[error("HTTP error: status {0}")]
    UnexpectedStatus(u16),
    /// The connection dropped while streaming the response body
    #[error("Failed reading response body: {0}")]
    BodyRead(#[source] reqwest::Error),
    /// Response body exceeded the size limit
    #[error("Response larger than {limit} bytes")]
    TooLarge { limit: usize },
    /// Received fewer bytes than the Content-Length header promised
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    Truncated { expected: u64, received: usize },
}

/// HTTP client for retrieving feed documents.
///
/// Wraps a [`reqwest::Client`] configured with the fixed User-Agent and a
/// bounded redirect policy. Cloning is cheap: the inner client is a handle
/// to a shared connection pool.
#[derive(Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    /// Builds a fetcher with the crate's standard client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the TLS backend fails to
    /// initialize.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(FetchError::Transport)?;
        Ok(Self { client })
    }

    /// Fetches the document at `url`, returning its raw bytes.
    ///
    /// The deadline covers the whole operation: connection, response
    /// headers, and body streaming. A single attempt is made; callers
    /// decide whether and when to try again.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] - the deadline elapsed
    /// - [`FetchError::Transport`] - connection or TLS failure
    /// - [`FetchError::UnexpectedStatus`] - non-2xx response
    /// - [`FetchError::BodyRead`] - connection dropped mid-body
    /// - [`FetchError::TooLarge`] - body exceeded the 10MB limit
    /// - [`FetchError::Truncated`] - body shorter than Content-Length
    pub async fn fetch(&self, url: &str, deadline: Duration) -> Result<Vec<u8>, FetchError> {
        tokio::time::timeout(deadline, self.fetch_inner(url))
            .await
            .map_err(|_| FetchError::Timeout(deadline))?
    }

    async fn fetch_inner(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }

        read_limited_bytes(response, MAX_BODY_BYTES).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for the completeness check after streaming
    let expected_length = response.content_length();

    // Fast path: reject on the Content-Length header alone
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::TooLarge { limit });
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::BodyRead)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::TooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    // A body shorter than Content-Length means the connection dropped
    // partway through a chunked read without surfacing a stream error.
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::Truncated {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
