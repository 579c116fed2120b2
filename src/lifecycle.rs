//! Engine lifecycle: install and activate
//!
//! States run uninitialized → installing → installed → active. Install
//! pre-warms the static segment with a fixed set of resources in one
//! all-or-nothing batch; activate garbage-collects every segment outside the
//! current generation's allow-list and claims open clients.

use crate::config::EngineConfig;
use crate::error::CacheGateError;
use crate::fetcher::Fetcher;
use crate::host::HostContext;
use crate::metrics::EngineMetrics;
use crate::models::{InboundRequest, ResponseSnapshot};
use crate::store::CacheStore;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// Lifecycle state of an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No lifecycle event has run yet
    Uninitialized,
    /// Install is in flight
    Installing,
    /// Install completed (successfully or not); eligible for activation
    Installed,
    /// This instance owns the current generation
    Active,
}

/// Governs install and activate for one engine generation
pub struct LifecycleManager {
    store: Arc<CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    config: Arc<EngineConfig>,
    state: watch::Sender<LifecycleState>,
    // Serializes activations; activation must never run concurrently with itself
    activation_gate: Mutex<()>,
    metrics: Option<EngineMetrics>,
}

impl LifecycleManager {
    /// Create a new LifecycleManager in the uninitialized state
    pub fn new(store: Arc<CacheStore>, fetcher: Arc<dyn Fetcher>, config: Arc<EngineConfig>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Uninitialized);
        LifecycleManager {
            store,
            fetcher,
            config,
            state,
            activation_gate: Mutex::new(()),
            metrics: None,
        }
    }

    /// Enable metrics recording
    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Install: pre-warm the static segment with the configured warm set.
    ///
    /// The batch is all-or-nothing: if any warm-set fetch fails or returns a
    /// non-2xx status, nothing is committed. That failure is logged and
    /// non-fatal; the engine still signals readiness and becomes eligible for
    /// activation.
    pub async fn install(&self, host: &dyn HostContext) {
        self.state.send_replace(LifecycleState::Installing);
        info!(segment = %self.config.static_segment, "installing engine generation");

        let urls = self.config.warm_set_urls();
        let total = urls.len();
        let mut batch: Vec<(String, ResponseSnapshot)> = Vec::with_capacity(total);
        let mut failed = 0usize;

        for url in urls {
            let request = InboundRequest::get(url);
            match self.fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    batch.push((request.identity(), response));
                }
                Ok(response) => {
                    warn!(url = %request.url, status = response.status.as_u16(), "warm-set fetch returned non-success");
                    failed += 1;
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, "warm-set fetch failed");
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            self.store
                .store_batch(&self.config.static_segment, batch)
                .await;
            info!(count = total, "warm set committed");
            if let Some(metrics) = &self.metrics {
                metrics.record_install(true);
            }
        } else {
            // Commit nothing; the warm set is absent until the next refresh
            let err = CacheGateError::InstallBatchFailure { failed, total };
            warn!(error = %err, "install proceeding without warm set");
            if let Some(metrics) = &self.metrics {
                metrics.record_install(false);
            }
        }

        host.skip_waiting().await;
        self.state.send_replace(LifecycleState::Installed);
    }

    /// Activate: delete every segment outside this generation's allow-list,
    /// then claim all open clients.
    ///
    /// Waits for an in-flight install to settle first, and never runs
    /// concurrently with another activation.
    ///
    /// # Returns
    /// The names of the segments that were deleted
    pub async fn activate(&self, host: &dyn HostContext, trigger: &str) -> Vec<String> {
        let _gate = self.activation_gate.lock().await;

        let mut rx = self.state.subscribe();
        if *rx.borrow() == LifecycleState::Installing {
            // Install must complete before activation for this generation
            let _ = rx.wait_for(|s| *s != LifecycleState::Installing).await;
        }

        let allow = self.config.generation();
        info!(allow = ?allow, trigger, "activating engine generation");
        let deleted = self.store.retain_segments(&allow).await;

        host.claim_clients().await;
        self.state.send_replace(LifecycleState::Active);

        if let Some(metrics) = &self.metrics {
            metrics.record_activation(trigger, deleted.len());
        }
        info!(deleted = deleted.len(), "activation complete");
        deleted
    }
}
