//! HTTP client for the herald backend endpoints.
//!
//! All payloads are plain JSON; dates serialize as ISO-8601 strings.
//! Callers in the scheduler and notification manager treat every call
//! here as best-effort: errors are logged and swallowed at the call site.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::preferences::NotificationPreferences;
use crate::reminder::{ReminderStatus, ScheduledReminder};

/// A push subscription as handed over by the platform surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushSubscriptionKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Client for the backend's preference, reminder, and delivery endpoints.
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Current user's notification preferences.
    pub async fn get_preferences(&self) -> Result<NotificationPreferences, ApiError> {
        let endpoint = self.url("/preferences");
        let resp = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        let resp = check_status(resp, &endpoint)?;
        resp.json().await.map_err(|source| ApiError::Http {
            endpoint,
            source,
        })
    }

    /// Persist updated preferences for the current user.
    pub async fn put_preferences(
        &self,
        prefs: &NotificationPreferences,
    ) -> Result<(), ApiError> {
        let endpoint = self.url("/preferences");
        let resp = self
            .http
            .put(&endpoint)
            .json(prefs)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        check_status(resp, &endpoint)?;
        Ok(())
    }

    /// Store a reminder for crash recovery.
    pub async fn create_reminder(&self, reminder: &ScheduledReminder) -> Result<(), ApiError> {
        let endpoint = self.url("/reminders");
        let resp = self
            .http
            .post(&endpoint)
            .json(reminder)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        check_status(resp, &endpoint)?;
        Ok(())
    }

    /// All reminders stored for the current user.
    pub async fn list_reminders(&self) -> Result<Vec<ScheduledReminder>, ApiError> {
        let endpoint = self.url("/reminders");
        let resp = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        let resp = check_status(resp, &endpoint)?;
        resp.json().await.map_err(|source| ApiError::Http {
            endpoint,
            source,
        })
    }

    /// Partial update of one reminder's status.
    pub async fn update_reminder_status(
        &self,
        id: &str,
        status: ReminderStatus,
    ) -> Result<(), ApiError> {
        let endpoint = self.url(&format!("/reminders/{id}"));
        let resp = self
            .http
            .put(&endpoint)
            .json(&json!({ "status": status }))
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        check_status(resp, &endpoint)?;
        Ok(())
    }

    /// Remove one stored reminder.
    pub async fn delete_reminder(&self, id: &str) -> Result<(), ApiError> {
        let endpoint = self.url(&format!("/reminders/{id}"));
        let resp = self
            .http
            .delete(&endpoint)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        check_status(resp, &endpoint)?;
        Ok(())
    }

    /// Ask the server to fan a push notification out to the user's
    /// registered subscriptions.
    pub async fn send_push(
        &self,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<(), ApiError> {
        let endpoint = self.url("/notifications/push");
        let resp = self
            .http
            .post(&endpoint)
            .json(&json!({ "title": title, "body": body, "data": data }))
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        check_status(resp, &endpoint)?;
        Ok(())
    }

    /// Ask the server to deliver a reminder by email.
    pub async fn send_email(
        &self,
        subject: &str,
        body: &str,
        reminder: &ScheduledReminder,
    ) -> Result<(), ApiError> {
        let endpoint = self.url("/notifications/email");
        let resp = self
            .http
            .post(&endpoint)
            .json(&json!({
                "subject": subject,
                "body": body,
                "taskId": reminder.task_id,
                "taskTitle": reminder.task_title,
                "dueDate": reminder.due_date,
            }))
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        check_status(resp, &endpoint)?;
        Ok(())
    }

    /// Register a push subscription for the current user.
    pub async fn register_push_subscription(
        &self,
        subscription: &PushSubscription,
    ) -> Result<(), ApiError> {
        let endpoint = self.url("/push/subscribe");
        let resp = self
            .http
            .post(&endpoint)
            .json(subscription)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        check_status(resp, &endpoint)?;
        Ok(())
    }
}

fn check_status(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, ApiError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: resp.status().as_u16(),
        })
    }
}
