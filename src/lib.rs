//! Cachegate
//!
//! A request-interception caching and offline-resilience engine. The engine
//! sits between application code and the network, intercepts outbound read
//! requests, and decides per request whether to serve from a local store, the
//! network, or both, according to a configurable strategy. It also manages
//! cache generations (install a warm set, retire stale segments) and exposes
//! a small control protocol for the hosting application.
//!
//! # Overview
//!
//! Reads flow one direction: host → [`RequestInterceptor`] → [`RuleTable`] →
//! [`StrategyEngine`] → cache and/or network → response. The
//! [`LifecycleManager`] and control channel operate orthogonally, mutating
//! [`CacheStore`] state outside the request path. Everything runs
//! single-logical-threaded and event-driven; concurrency is interleaving of
//! async continuations at cache, network, and channel await points.
//!
//! # Strategies
//!
//! - **Cache-first**: serve the cached entry and refresh in the background;
//!   on a miss, fetch in the foreground and fall back to a synthetic 503.
//! - **Network-first**: fetch; on failure fall back to cache, then to the
//!   designated offline root for navigations.
//! - **Stale-while-revalidate**: serve stale immediately, revalidate in the
//!   background; wait for the network only when nothing is cached.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cachegate::{Engine, EngineConfig, HttpFetcher, InboundRequest, NoopHost};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig {
//!     origin: "https://blog.example".to_string(),
//!     ..Default::default()
//! };
//! let engine = Engine::new(config, Arc::new(HttpFetcher::new()?), Arc::new(NoopHost))?;
//!
//! engine.handle_install().await;
//! engine.handle_activate().await;
//!
//! let outcome = engine
//!     .handle_fetch(&InboundRequest::get("https://blog.example/app.js"))
//!     .await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`Engine`]: facade wiring the handlers to injected capabilities
//! - [`RequestInterceptor`]: GET/http(s) filter, classification, dispatch
//! - [`RuleTable`]: ordered first-match-wins strategy rules
//! - [`StrategyEngine`]: the three caching algorithms
//! - [`CacheStore`]: named segments of request identity → response snapshot
//! - [`LifecycleManager`]: install / activate state machine
//! - [`Fetcher`]: network transport capability supplied by the host
//! - [`HostContext`]: host effects (skip-waiting, claim-clients, notify)

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod host;
pub mod interceptor;
pub mod lifecycle;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod rules;
pub mod store;
pub mod strategy;

// Re-export commonly used types
pub use config::EngineConfig;
pub use control::{ControlMessage, ControlReply, ControlRequest, WireMessage};
pub use engine::Engine;
pub use error::{CacheGateError, Result};
pub use fetcher::{Fetcher, HttpFetcher};
pub use host::{HostContext, NoopHost};
pub use interceptor::{FetchOutcome, RequestInterceptor};
pub use lifecycle::{LifecycleManager, LifecycleState};
pub use metrics::EngineMetrics;
pub use models::{InboundRequest, RequestMode, ResponseSnapshot};
pub use notify::{Notification, NotificationAction, ACTION_DISMISS, ACTION_OPEN_VIEW};
pub use rules::{Classification, RulePattern, RuleTable, Strategy, StrategyRule};
pub use store::{CacheStore, StoreStats};
pub use strategy::StrategyEngine;
