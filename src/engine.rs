//! The engine facade: lifecycle, read path, and control channel in one place
//!
//! The host registers one [`Engine`] per scope and routes its event dispatch
//! into the four handlers: `handle_install`, `handle_activate`,
//! `handle_fetch`, and `handle_control`. The engine owns the cache store;
//! everything else (transport, host effects) is injected.

use crate::config::EngineConfig;
use crate::control::{ControlMessage, ControlReply, ControlRequest};
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::host::HostContext;
use crate::interceptor::{FetchOutcome, RequestInterceptor};
use crate::lifecycle::{LifecycleManager, LifecycleState};
use crate::metrics::EngineMetrics;
use crate::models::InboundRequest;
use crate::notify::{Notification, ACTION_OPEN_VIEW};
use crate::store::CacheStore;
use crate::strategy::StrategyEngine;
use std::sync::Arc;
use tracing::{debug, warn};

/// Request-interception caching engine bound to one scope
pub struct Engine {
    config: Arc<EngineConfig>,
    store: Arc<CacheStore>,
    interceptor: RequestInterceptor,
    lifecycle: LifecycleManager,
    host: Arc<dyn HostContext>,
    metrics: Option<EngineMetrics>,
}

impl Engine {
    /// Create an engine from its injected capabilities
    pub fn new(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn HostContext>,
    ) -> Result<Self> {
        Self::build(config, fetcher, host, None)
    }

    /// Create an engine that records metrics
    pub fn with_metrics(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn HostContext>,
        metrics: EngineMetrics,
    ) -> Result<Self> {
        Self::build(config, fetcher, host, Some(metrics))
    }

    fn build(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn HostContext>,
        metrics: Option<EngineMetrics>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let store = Arc::new(CacheStore::new());

        let mut strategies =
            StrategyEngine::new(Arc::clone(&store), Arc::clone(&fetcher), &config);
        let mut lifecycle =
            LifecycleManager::new(Arc::clone(&store), fetcher, Arc::clone(&config));
        if let Some(metrics) = &metrics {
            strategies = strategies.with_metrics(metrics.clone());
            lifecycle = lifecycle.with_metrics(metrics.clone());
        }

        let interceptor = RequestInterceptor::new(config.rules.clone(), Arc::new(strategies));

        Ok(Engine {
            config,
            store,
            interceptor,
            lifecycle,
            host,
            metrics,
        })
    }

    /// The engine's cache store, for host-side introspection
    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Install handler: pre-warm the static segment and signal readiness
    pub async fn handle_install(&self) {
        self.lifecycle.install(self.host.as_ref()).await;
    }

    /// Activate handler: collect prior generations and claim clients
    pub async fn handle_activate(&self) {
        self.lifecycle.activate(self.host.as_ref(), "lifecycle").await;
    }

    /// Fetch handler: intercept a read request
    pub async fn handle_fetch(&self, request: &InboundRequest) -> Result<FetchOutcome> {
        self.interceptor.intercept(request).await
    }

    /// Control handler: run one control request and post its reply
    ///
    /// Unknown kinds are logged and the reply sender dropped, which the
    /// caller observes as a closed channel.
    pub async fn handle_control(&self, request: ControlRequest) {
        let message = match ControlMessage::parse(&request.message) {
            Ok(message) => message,
            Err(_) => {
                // No reply for unknown kinds; the caller's receiver closes
                warn!(kind = %request.message.kind, "ignoring unknown control message");
                if let Some(metrics) = &self.metrics {
                    metrics.record_control_message("unknown");
                }
                return;
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_control_message(message.kind());
        }

        let reply = match message {
            ControlMessage::ForceActivate => {
                self.lifecycle.activate(self.host.as_ref(), "control").await;
                ControlReply::Activated
            }
            ControlMessage::QueryCacheSize => {
                let size = self.store.total_declared_bytes().await;
                ControlReply::CacheSize { size }
            }
            ControlMessage::ClearAll => {
                let deleted = self.store.clear_all().await;
                if let Some(metrics) = &self.metrics {
                    metrics.record_clear(deleted);
                }
                ControlReply::Cleared
            }
        };

        if request.reply.send(reply).is_err() {
            debug!(kind = message.kind(), "control caller went away before reply");
        }
    }

    /// Push handler: render a content-update notification via the host
    pub async fn handle_push(&self, payload: &str) {
        self.host
            .show_notification(Notification::content_update(payload))
            .await;
    }

    /// Resolve a notification action to the path the host should open
    pub fn notification_click_target(&self, action: &str) -> Option<String> {
        if action == ACTION_OPEN_VIEW {
            Some(self.config.notification_view.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::WireMessage;
    use crate::error::CacheGateError;
    use crate::host::NoopHost;
    use crate::models::ResponseSnapshot;
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};

    struct OfflineFetcher;

    #[async_trait]
    impl Fetcher for OfflineFetcher {
        async fn fetch(&self, _request: &InboundRequest) -> Result<ResponseSnapshot> {
            Err(CacheGateError::network("offline"))
        }
    }

    fn engine() -> Engine {
        let config = EngineConfig {
            origin: "https://blog.example".to_string(),
            ..Default::default()
        };
        Engine::new(config, Arc::new(OfflineFetcher), Arc::new(NoopHost)).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_control_kind_gets_no_reply() {
        let engine = engine();
        let (request, rx) = ControlRequest::new(WireMessage::of_kind("SELF_DESTRUCT"));

        engine.handle_control(request).await;
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_clear_then_query_reports_zero() {
        let engine = engine();
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_LENGTH,
            http::HeaderValue::from_static("100"),
        );
        engine
            .store()
            .store(
                "static-v1",
                "GET /a",
                ResponseSnapshot::new(StatusCode::OK, headers, Bytes::new()),
            )
            .await;

        let (request, rx) = ControlRequest::new(WireMessage::of_kind("CLEAR_ALL"));
        engine.handle_control(request).await;
        assert_eq!(rx.await.unwrap(), ControlReply::Cleared);

        let (request, rx) = ControlRequest::new(WireMessage::of_kind("QUERY_CACHE_SIZE"));
        engine.handle_control(request).await;
        assert_eq!(rx.await.unwrap(), ControlReply::CacheSize { size: 0 });
    }

    #[test]
    fn test_notification_click_target() {
        let engine = engine();
        assert_eq!(
            engine.notification_click_target(ACTION_OPEN_VIEW),
            Some("/posts".to_string())
        );
        assert_eq!(engine.notification_click_target("dismiss"), None);
    }
}
