//! Network transport capability
//!
//! The engine never implements HTTP itself; it calls through the [`Fetcher`]
//! trait, supplied by the host at registration. [`HttpFetcher`] is the
//! reqwest-backed default for hosts without their own transport.

use crate::error::{CacheGateError, Result};
use crate::models::{InboundRequest, ResponseSnapshot};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Network-fetch capability used by strategies and the lifecycle manager
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request against the origin and capture the full response
    ///
    /// # Returns
    /// * `Ok(ResponseSnapshot)` for any completed HTTP exchange, regardless
    ///   of status code
    /// * `Err(CacheGateError::NetworkFailure)` on transport-level failure
    async fn fetch(&self, request: &InboundRequest) -> Result<ResponseSnapshot>;
}

/// Default reqwest-backed transport
///
/// No request timeout is set by default: a hanging network-first attempt
/// blocks its cache fallback, matching the engine's documented behavior.
/// Hosts that want a bound use [`HttpFetcher::with_timeout`].
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with no request timeout
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| CacheGateError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpFetcher { client })
    }

    /// Create a fetcher with a per-request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheGateError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &InboundRequest) -> Result<ResponseSnapshot> {
        debug!(url = %request.url, "fetching from origin");

        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .send()
            .await
            .map_err(CacheGateError::network)?;

        let status = response.status();
        let headers = response.headers().clone();

        // Buffer the body once; the snapshot is then both returned to the
        // caller and, when cacheable, written to the store.
        let body = response.bytes().await.map_err(CacheGateError::network)?;

        debug!(url = %request.url, status = status.as_u16(), size = body.len(), "origin response captured");
        Ok(ResponseSnapshot::new(status, headers, body))
    }
}
