//! Notification delivery manager.
//!
//! Abstracts over three delivery paths -- local display through the
//! injected [`NotificationSurface`], server-fanned push, and server-sent
//! email -- and owns permission/subscription state. Every external call is
//! wrapped so that failure degrades (no push, default preferences) instead
//! of propagating into caller flows.

mod surface;

pub use surface::{ConsoleSurface, DisplayId, NotificationOptions, NotificationSurface, SurfaceError};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::preferences::NotificationPreferences;

/// Displayed notifications self-dismiss after this long. UX policy only.
const AUTO_DISMISS: Duration = Duration::from_secs(5);

/// Process-wide notification service.
///
/// Constructed once at the composition root and shared by reference; never
/// a language-level singleton, so tests build fresh instances freely.
pub struct NotificationManager {
    surface: Arc<dyn NotificationSurface>,
    api: Arc<ApiClient>,
    push_server_key: String,
}

impl NotificationManager {
    pub fn new(
        surface: Arc<dyn NotificationSurface>,
        api: Arc<ApiClient>,
        push_server_key: impl Into<String>,
    ) -> Self {
        Self {
            surface,
            api,
            push_server_key: push_server_key.into(),
        }
    }

    /// Whether the host environment grants display permission.
    ///
    /// Never errors; `false` when the capability is absent.
    pub fn request_permission(&self) -> bool {
        self.surface.request_permission()
    }

    /// Fire-and-forget local display.
    ///
    /// Silently no-ops (with a logged warning) when permission is not
    /// granted. Displayed notifications auto-dismiss after five seconds.
    pub fn show_notification(&self, title: &str, options: &NotificationOptions) {
        if !self.surface.is_permitted() {
            warn!(title, "notification permission not granted, dropping");
            return;
        }
        match self.surface.display(title, options) {
            Ok(id) => {
                let surface = Arc::clone(&self.surface);
                tokio::spawn(async move {
                    tokio::time::sleep(AUTO_DISMISS).await;
                    surface.dismiss(id);
                });
            }
            Err(e) => warn!(title, error = %e, "notification display failed"),
        }
    }

    /// Display through the rich actionable path when the surface supports
    /// it, otherwise fall back to a plain local notification.
    ///
    /// The fallback is unconditional: an unavailable or failing rich path
    /// is never an error.
    pub fn show_push_notification(&self, title: &str, body: &str, data: &serde_json::Value) {
        if self.surface.supports_actions() {
            match self.surface.display_actionable(title, body, data) {
                Ok(_) => return,
                Err(e) => warn!(title, error = %e, "actionable display failed, falling back"),
            }
        }
        self.show_notification(
            title,
            &NotificationOptions {
                body: body.to_string(),
                ..NotificationOptions::default()
            },
        );
    }

    /// Idempotently establish a push subscription and register it with the
    /// backend. Failures anywhere in the chain are logged, never returned.
    pub async fn setup_push_notifications(&self) {
        if let Some(existing) = self.surface.push_subscription() {
            debug!(endpoint = %existing.endpoint, "push subscription already exists");
            return;
        }
        if self.push_server_key.is_empty() {
            warn!("no push server key configured, skipping push setup");
            return;
        }
        let subscription = match self.surface.subscribe(&self.push_server_key) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "push subscription failed");
                return;
            }
        };
        if let Err(e) = self.api.register_push_subscription(&subscription).await {
            warn!(error = %e, "push subscription registration failed");
        }
    }

    /// Current preferences, falling back to the hardcoded defaults when
    /// the endpoint is unreachable.
    pub async fn get_preferences(&self) -> NotificationPreferences {
        match self.api.get_preferences().await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(error = %e, "preference fetch failed, using defaults");
                NotificationPreferences::default()
            }
        }
    }

    /// Persist updated preferences. Best-effort.
    pub async fn update_preferences(&self, prefs: &NotificationPreferences) {
        if let Err(e) = self.api.put_preferences(prefs).await {
            warn!(error = %e, "preference update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PushSubscription, PushSubscriptionKeys};
    use std::sync::Mutex;

    /// Test surface that records what was displayed.
    #[derive(Default)]
    struct RecordingSurface {
        permitted: bool,
        actions: bool,
        subscribed: Option<PushSubscription>,
        displayed: Mutex<Vec<(String, String)>>,
        actionable: Mutex<Vec<String>>,
    }

    impl NotificationSurface for RecordingSurface {
        fn name(&self) -> &str {
            "recording"
        }
        fn is_permitted(&self) -> bool {
            self.permitted
        }
        fn request_permission(&self) -> bool {
            self.permitted
        }
        fn display(
            &self,
            title: &str,
            options: &NotificationOptions,
        ) -> Result<DisplayId, SurfaceError> {
            self.displayed
                .lock()
                .unwrap()
                .push((title.to_string(), options.body.clone()));
            Ok(0)
        }
        fn dismiss(&self, _id: DisplayId) {}
        fn supports_actions(&self) -> bool {
            self.actions
        }
        fn display_actionable(
            &self,
            title: &str,
            _body: &str,
            _data: &serde_json::Value,
        ) -> Result<DisplayId, SurfaceError> {
            self.actionable.lock().unwrap().push(title.to_string());
            Ok(0)
        }
        fn push_subscription(&self) -> Option<PushSubscription> {
            self.subscribed.clone()
        }
        fn subscribe(&self, _server_key: &str) -> Result<PushSubscription, SurfaceError> {
            Ok(PushSubscription {
                endpoint: "https://push.example/sub".to_string(),
                keys: PushSubscriptionKeys {
                    p256dh: "p".to_string(),
                    auth: "a".to_string(),
                },
            })
        }
    }

    fn manager(surface: RecordingSurface, base_url: &str) -> (NotificationManager, Arc<RecordingSurface>) {
        let surface = Arc::new(surface);
        let manager = NotificationManager::new(
            Arc::clone(&surface) as Arc<dyn NotificationSurface>,
            Arc::new(ApiClient::new(base_url)),
            "server-key",
        );
        (manager, surface)
    }

    #[tokio::test]
    async fn show_notification_noops_without_permission() {
        let (m, surface) = manager(
            RecordingSurface {
                permitted: false,
                ..Default::default()
            },
            "http://127.0.0.1:1",
        );
        m.show_notification("hello", &NotificationOptions::default());
        assert!(surface.displayed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn push_notification_prefers_actionable_path() {
        let (m, surface) = manager(
            RecordingSurface {
                permitted: true,
                actions: true,
                ..Default::default()
            },
            "http://127.0.0.1:1",
        );
        m.show_push_notification("rich", "body", &serde_json::json!({}));
        assert_eq!(surface.actionable.lock().unwrap().as_slice(), ["rich"]);
        assert!(surface.displayed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn push_notification_falls_back_to_plain_display() {
        let (m, surface) = manager(
            RecordingSurface {
                permitted: true,
                actions: false,
                ..Default::default()
            },
            "http://127.0.0.1:1",
        );
        m.show_push_notification("plain", "body", &serde_json::json!({}));
        assert_eq!(
            surface.displayed.lock().unwrap().as_slice(),
            [("plain".to_string(), "body".to_string())]
        );
    }

    #[tokio::test]
    async fn setup_push_is_idempotent() {
        let mut server = mockito::Server::new_async().await;
        let register = server
            .mock("POST", "/push/subscribe")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let existing = PushSubscription {
            endpoint: "https://push.example/existing".to_string(),
            keys: PushSubscriptionKeys {
                p256dh: "p".to_string(),
                auth: "a".to_string(),
            },
        };
        let (m, _surface) = manager(
            RecordingSurface {
                permitted: true,
                subscribed: Some(existing),
                ..Default::default()
            },
            &server.url(),
        );
        m.setup_push_notifications().await;
        register.assert_async().await;
    }

    #[tokio::test]
    async fn setup_push_registers_new_subscription() {
        let mut server = mockito::Server::new_async().await;
        let register = server
            .mock("POST", "/push/subscribe")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "endpoint": "https://push.example/sub",
            })))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let (m, _surface) = manager(
            RecordingSurface {
                permitted: true,
                ..Default::default()
            },
            &server.url(),
        );
        m.setup_push_notifications().await;
        register.assert_async().await;
    }

    #[tokio::test]
    async fn update_preferences_puts_the_full_document() {
        let mut server = mockito::Server::new_async().await;
        let put = server
            .mock("PUT", "/preferences")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "dailyDigest": false,
            })))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let (m, _surface) = manager(
            RecordingSurface {
                permitted: true,
                ..Default::default()
            },
            &server.url(),
        );
        let mut prefs = NotificationPreferences::default();
        prefs.daily_digest = false;
        m.update_preferences(&prefs).await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn preferences_fall_back_to_defaults_on_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/preferences")
            .with_status(500)
            .create_async()
            .await;

        let (m, _surface) = manager(
            RecordingSurface {
                permitted: true,
                ..Default::default()
            },
            &server.url(),
        );
        let prefs = m.get_preferences().await;
        assert_eq!(prefs.deadline_reminders.intervals, vec![1440, 120, 30]);
    }
}
