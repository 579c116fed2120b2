//! The three caching strategies
//!
//! Each strategy takes a request, the cache store, and the network capability
//! and resolves to some response. Background refreshes are fire-and-forget:
//! they outlive the instigating request and their only observable effect is a
//! cache write that last-write-wins against concurrent refreshes of the same
//! key.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::metrics::EngineMetrics;
use crate::models::{InboundRequest, RequestMode, ResponseSnapshot};
use crate::rules::Strategy;
use crate::store::CacheStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Executes a classified request against cache and network
pub struct StrategyEngine {
    store: Arc<CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    static_segment: String,
    dynamic_segment: String,
    fallback_identity: String,
    metrics: Option<EngineMetrics>,
}

impl StrategyEngine {
    /// Create a new StrategyEngine
    pub fn new(store: Arc<CacheStore>, fetcher: Arc<dyn Fetcher>, config: &EngineConfig) -> Self {
        let fallback_identity = InboundRequest::get(config.fallback_url()).identity();
        StrategyEngine {
            store,
            fetcher,
            static_segment: config.static_segment.clone(),
            dynamic_segment: config.dynamic_segment.clone(),
            fallback_identity,
            metrics: None,
        }
    }

    /// Enable metrics recording
    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Dispatch a request to the given strategy
    pub async fn execute(
        &self,
        strategy: Strategy,
        request: &InboundRequest,
        max_age: Option<Duration>,
    ) -> Result<ResponseSnapshot> {
        if let Some(metrics) = &self.metrics {
            metrics.record_fetch(strategy.as_str());
        }
        match strategy {
            Strategy::CacheFirst => self.cache_first(request, max_age).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, max_age).await,
        }
    }

    /// Cache-first: serve from the static segment, refresh in the background.
    ///
    /// On a miss the fetch runs in the foreground. If that fetch fails, a
    /// stale entry past the rule's max-age is still served before resorting
    /// to the synthetic unavailable response: when the network is down, a
    /// stale asset beats no asset.
    async fn cache_first(
        &self,
        request: &InboundRequest,
        max_age: Option<Duration>,
    ) -> Result<ResponseSnapshot> {
        let key = request.identity();
        let cached = self.store.lookup(&self.static_segment, &key, max_age).await;
        self.record_lookup(Strategy::CacheFirst, cached.is_some());

        if let Some(cached) = cached {
            self.spawn_background_refresh(
                Strategy::CacheFirst,
                self.static_segment.clone(),
                request.clone(),
            );
            return Ok(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store.store(&self.static_segment, &key, response.clone()).await;
                }
                Ok(response)
            }
            Err(e) => {
                self.record_network_failure(Strategy::CacheFirst, "foreground");
                if let Some(stale) = self.store.lookup(&self.static_segment, &key, None).await {
                    debug!(url = %request.url, error = %e, "serving stale entry after fetch failure");
                    return Ok(stale);
                }
                warn!(url = %request.url, error = %e, "cache-first fetch failed with no cached fallback");
                Ok(ResponseSnapshot::unavailable())
            }
        }
    }

    /// Network-first: fetch, fall back to the dynamic segment, then to the
    /// designated offline root for navigations.
    ///
    /// The fallback lookup deliberately ignores the rule's max-age: when the
    /// network is down, a stale page beats no page.
    async fn network_first(&self, request: &InboundRequest) -> Result<ResponseSnapshot> {
        let key = request.identity();

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store.store(&self.dynamic_segment, &key, response.clone()).await;
                }
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "network failed, trying cache");
                self.record_network_failure(Strategy::NetworkFirst, "foreground");

                let cached = self.store.lookup(&self.dynamic_segment, &key, None).await;
                self.record_lookup(Strategy::NetworkFirst, cached.is_some());
                if let Some(cached) = cached {
                    return Ok(cached);
                }

                if request.mode == RequestMode::Navigate {
                    if let Some(root) = self.store.lookup_any(&self.fallback_identity).await {
                        debug!(url = %request.url, "serving offline root for navigation");
                        return Ok(root);
                    }
                    return Ok(ResponseSnapshot::unavailable());
                }

                Err(e)
            }
        }
    }

    /// Stale-while-revalidate: serve the dynamic-segment entry immediately if
    /// one exists and refresh it in the background; otherwise wait for the
    /// network.
    async fn stale_while_revalidate(
        &self,
        request: &InboundRequest,
        max_age: Option<Duration>,
    ) -> Result<ResponseSnapshot> {
        let key = request.identity();
        let cached = self.store.lookup(&self.dynamic_segment, &key, max_age).await;
        self.record_lookup(Strategy::StaleWhileRevalidate, cached.is_some());

        if let Some(cached) = cached {
            self.spawn_background_refresh(
                Strategy::StaleWhileRevalidate,
                self.dynamic_segment.clone(),
                request.clone(),
            );
            return Ok(cached);
        }

        // No cached value: the revalidation fetch is the response, and its
        // failure propagates to the caller.
        let response = self.fetcher.fetch(request).await.map_err(|e| {
            self.record_network_failure(Strategy::StaleWhileRevalidate, "foreground");
            e
        })?;
        if response.is_success() {
            self.store.store(&self.dynamic_segment, &key, response.clone()).await;
        }
        Ok(response)
    }

    /// Fire-and-forget refresh: fetch, overwrite the entry on 2xx, swallow
    /// failures. Runs to completion even after the instigating request has
    /// been answered.
    fn spawn_background_refresh(&self, strategy: Strategy, segment: String, request: InboundRequest) {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let metrics = self.metrics.clone();

        tokio::spawn(async move {
            let key = request.identity();
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    store.store(&segment, &key, response).await;
                    debug!(url = %request.url, segment = %segment, "background refresh committed");
                }
                Ok(response) => {
                    debug!(
                        url = %request.url,
                        status = response.status.as_u16(),
                        "background refresh discarded non-success response"
                    );
                }
                Err(e) => {
                    debug!(url = %request.url, error = %e, "background refresh failed");
                    if let Some(metrics) = &metrics {
                        metrics.record_network_failure(strategy.as_str(), "background");
                    }
                }
            }
        });
    }

    fn record_lookup(&self, strategy: Strategy, hit: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_lookup(strategy.as_str(), hit);
        }
    }

    fn record_network_failure(&self, strategy: Strategy, phase: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_network_failure(strategy.as_str(), phase);
        }
    }
}
