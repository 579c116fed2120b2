//! Notification display surface
//!
//! A minor peripheral capability: a text payload is rendered as a system
//! notification with two predefined actions. This is an external-effect call
//! routed through the host, not part of the caching logic.

use serde::{Deserialize, Serialize};

/// Action identifier for opening the configured view
pub const ACTION_OPEN_VIEW: &str = "open-view";
/// Action identifier for dismissing the notification
pub const ACTION_DISMISS: &str = "dismiss";

/// One of the notification's predefined actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A system notification ready for the host to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    /// Build a content-update notification from a push payload
    ///
    /// An empty payload falls back to a generic body.
    pub fn content_update(payload: &str) -> Self {
        let body = if payload.is_empty() {
            "New content is available".to_string()
        } else {
            payload.to_string()
        };
        Notification {
            title: "Content update".to_string(),
            body,
            actions: vec![
                NotificationAction {
                    action: ACTION_OPEN_VIEW.to_string(),
                    title: "View details".to_string(),
                },
                NotificationAction {
                    action: ACTION_DISMISS.to_string(),
                    title: "Dismiss".to_string(),
                },
            ],
        }
    }
}
