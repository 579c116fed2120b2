//! Host environment capabilities
//!
//! The engine runs embedded in a host runtime and reaches back into it for a
//! handful of external effects: readiness signalling after install, claiming
//! open client contexts after activation, and rendering notifications.

use crate::notify::Notification;
use async_trait::async_trait;

/// Capabilities the host supplies when registering the engine
#[async_trait]
pub trait HostContext: Send + Sync {
    /// Signal that the freshly installed engine version should skip waiting
    /// and become eligible for activation immediately
    async fn skip_waiting(&self);

    /// Take control of all currently open client contexts, rather than
    /// waiting for their next navigation
    async fn claim_clients(&self);

    /// Render a system notification
    async fn show_notification(&self, _notification: Notification) {}
}

/// Host that ignores every effect; useful for tests and headless embeddings
pub struct NoopHost;

#[async_trait]
impl HostContext for NoopHost {
    async fn skip_waiting(&self) {}

    async fn claim_clients(&self) {}
}
