//! Platform notification surface seam.
//!
//! Display and push-subscription capabilities vary by host environment,
//! so the surface is injected as a trait object and everything above it
//! degrades gracefully when a capability is absent.

use crate::api::PushSubscription;

pub type SurfaceError = Box<dyn std::error::Error + Send + Sync>;

/// Handle for a displayed notification, used to dismiss it later.
pub type DisplayId = u64;

/// Options for a locally displayed notification.
#[derive(Debug, Clone, Default)]
pub struct NotificationOptions {
    pub body: String,
    pub sound: bool,
    pub vibrate: bool,
}

/// A notification display + push subscription surface.
///
/// Implementations are expected to be cheap to call and safe to share;
/// capability checks (`is_permitted`, `supports_actions`) gate the richer
/// paths and every method must behave sensibly when the capability is
/// missing rather than panic.
pub trait NotificationSurface: Send + Sync {
    /// Unique identifier (e.g. "console", "desktop").
    fn name(&self) -> &str;

    /// Whether display permission has been granted.
    fn is_permitted(&self) -> bool;

    /// Ask the platform for display permission.
    ///
    /// Never errors; returns `false` when the capability is absent.
    fn request_permission(&self) -> bool;

    /// Display a notification, returning a handle for dismissal.
    fn display(&self, title: &str, options: &NotificationOptions) -> Result<DisplayId, SurfaceError>;

    /// Dismiss a previously displayed notification. No-op for unknown ids.
    fn dismiss(&self, id: DisplayId);

    /// Whether the rich path with action buttons is available.
    fn supports_actions(&self) -> bool {
        false
    }

    /// Display through the rich path. Only called when
    /// [`supports_actions`](Self::supports_actions) returned true.
    fn display_actionable(
        &self,
        title: &str,
        body: &str,
        _data: &serde_json::Value,
    ) -> Result<DisplayId, SurfaceError> {
        self.display(
            title,
            &NotificationOptions {
                body: body.to_string(),
                ..NotificationOptions::default()
            },
        )
    }

    /// The current push subscription, if one exists.
    fn push_subscription(&self) -> Option<PushSubscription> {
        None
    }

    /// Create a push subscription using the server-provided public key.
    fn subscribe(&self, _server_key: &str) -> Result<PushSubscription, SurfaceError> {
        Err("push subscriptions are not supported on this surface".into())
    }
}

/// Log-only surface for headless environments.
///
/// Always permitted, never push-capable. Displayed notifications are
/// emitted through tracing so a daemon's delivery activity is visible in
/// its logs.
#[derive(Default)]
pub struct ConsoleSurface {
    next_id: std::sync::atomic::AtomicU64,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationSurface for ConsoleSurface {
    fn name(&self) -> &str {
        "console"
    }

    fn is_permitted(&self) -> bool {
        true
    }

    fn request_permission(&self) -> bool {
        true
    }

    fn display(&self, title: &str, options: &NotificationOptions) -> Result<DisplayId, SurfaceError> {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        tracing::info!(target: "herald::notify", id, title, body = %options.body, "notification");
        Ok(id)
    }

    fn dismiss(&self, id: DisplayId) {
        tracing::debug!(target: "herald::notify", id, "notification dismissed");
    }
}
