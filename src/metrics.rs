//! Prometheus metrics for the cachegate engine

use prometheus::{register_counter_vec, CounterVec, Registry};
use std::sync::Arc;

/// Counters covering the request path, lifecycle, and control channel
#[derive(Clone)]
pub struct EngineMetrics {
    /// Intercepted requests by strategy
    pub fetch_requests_total: Arc<CounterVec>,

    /// Cache hits by strategy
    pub cache_hits_total: Arc<CounterVec>,

    /// Cache misses by strategy
    pub cache_misses_total: Arc<CounterVec>,

    /// Network failures by strategy and phase (foreground/background)
    pub network_failures_total: Arc<CounterVec>,

    /// Install attempts by result (committed/batch_failed)
    pub installs_total: Arc<CounterVec>,

    /// Activations by trigger (lifecycle/control)
    pub activations_total: Arc<CounterVec>,

    /// Segments deleted by reason (activation/clear)
    pub segments_deleted_total: Arc<CounterVec>,

    /// Control messages by kind (unknown kinds counted under "unknown")
    pub control_messages_total: Arc<CounterVec>,
}

impl EngineMetrics {
    /// Create metrics registered against the default registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let fetch_requests_total = register_counter_vec!(
            "cachegate_fetch_requests_total",
            "Total intercepted requests by strategy",
            &["strategy"]
        )?;

        let cache_hits_total = register_counter_vec!(
            "cachegate_cache_hits_total",
            "Total cache hits by strategy",
            &["strategy"]
        )?;

        let cache_misses_total = register_counter_vec!(
            "cachegate_cache_misses_total",
            "Total cache misses by strategy",
            &["strategy"]
        )?;

        let network_failures_total = register_counter_vec!(
            "cachegate_network_failures_total",
            "Total network failures by strategy and phase",
            &["strategy", "phase"]
        )?;

        let installs_total = register_counter_vec!(
            "cachegate_installs_total",
            "Total install attempts by result",
            &["result"]
        )?;

        let activations_total = register_counter_vec!(
            "cachegate_activations_total",
            "Total activations by trigger",
            &["trigger"]
        )?;

        let segments_deleted_total = register_counter_vec!(
            "cachegate_segments_deleted_total",
            "Total segments deleted by reason",
            &["reason"]
        )?;

        let control_messages_total = register_counter_vec!(
            "cachegate_control_messages_total",
            "Total control messages by kind",
            &["kind"]
        )?;

        Ok(Self {
            fetch_requests_total: Arc::new(fetch_requests_total),
            cache_hits_total: Arc::new(cache_hits_total),
            cache_misses_total: Arc::new(cache_misses_total),
            network_failures_total: Arc::new(network_failures_total),
            installs_total: Arc::new(installs_total),
            activations_total: Arc::new(activations_total),
            segments_deleted_total: Arc::new(segments_deleted_total),
            control_messages_total: Arc::new(control_messages_total),
        })
    }

    /// Create metrics registered against a custom registry
    pub fn with_registry(registry: &Registry) -> Result<Self, prometheus::Error> {
        fn counter(
            registry: &Registry,
            name: &str,
            help: &str,
            labels: &[&str],
        ) -> Result<Arc<CounterVec>, prometheus::Error> {
            let vec = CounterVec::new(prometheus::Opts::new(name, help), labels)?;
            registry.register(Box::new(vec.clone()))?;
            Ok(Arc::new(vec))
        }

        Ok(Self {
            fetch_requests_total: counter(
                registry,
                "cachegate_fetch_requests_total",
                "Total intercepted requests by strategy",
                &["strategy"],
            )?,
            cache_hits_total: counter(
                registry,
                "cachegate_cache_hits_total",
                "Total cache hits by strategy",
                &["strategy"],
            )?,
            cache_misses_total: counter(
                registry,
                "cachegate_cache_misses_total",
                "Total cache misses by strategy",
                &["strategy"],
            )?,
            network_failures_total: counter(
                registry,
                "cachegate_network_failures_total",
                "Total network failures by strategy and phase",
                &["strategy", "phase"],
            )?,
            installs_total: counter(
                registry,
                "cachegate_installs_total",
                "Total install attempts by result",
                &["result"],
            )?,
            activations_total: counter(
                registry,
                "cachegate_activations_total",
                "Total activations by trigger",
                &["trigger"],
            )?,
            segments_deleted_total: counter(
                registry,
                "cachegate_segments_deleted_total",
                "Total segments deleted by reason",
                &["reason"],
            )?,
            control_messages_total: counter(
                registry,
                "cachegate_control_messages_total",
                "Total control messages by kind",
                &["kind"],
            )?,
        })
    }

    /// Record an intercepted request
    pub fn record_fetch(&self, strategy: &str) {
        self.fetch_requests_total.with_label_values(&[strategy]).inc();
    }

    /// Record a cache lookup outcome
    pub fn record_lookup(&self, strategy: &str, hit: bool) {
        if hit {
            self.cache_hits_total.with_label_values(&[strategy]).inc();
        } else {
            self.cache_misses_total.with_label_values(&[strategy]).inc();
        }
    }

    /// Record a network failure; phase is "foreground" or "background"
    pub fn record_network_failure(&self, strategy: &str, phase: &str) {
        self.network_failures_total
            .with_label_values(&[strategy, phase])
            .inc();
    }

    /// Record an install attempt
    pub fn record_install(&self, committed: bool) {
        let result = if committed { "committed" } else { "batch_failed" };
        self.installs_total.with_label_values(&[result]).inc();
    }

    /// Record an activation; trigger is "lifecycle" or "control"
    pub fn record_activation(&self, trigger: &str, segments_deleted: usize) {
        self.activations_total.with_label_values(&[trigger]).inc();
        self.segments_deleted_total
            .with_label_values(&["activation"])
            .inc_by(segments_deleted as f64);
    }

    /// Record a clear-all operation
    pub fn record_clear(&self, segments_deleted: usize) {
        self.segments_deleted_total
            .with_label_values(&["clear"])
            .inc_by(segments_deleted as f64);
    }

    /// Record a control message
    pub fn record_control_message(&self, kind: &str) {
        self.control_messages_total.with_label_values(&[kind]).inc();
    }
}
