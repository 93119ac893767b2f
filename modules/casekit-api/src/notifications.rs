//! Notification center endpoints: paginated inbox, read tracking,
//! statistics, and delivery preferences.

use std::sync::Arc;

use async_trait::async_trait;
use casekit_http::{HttpClient, Query};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ApiResult;

/// One inbox notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: Option<String>,
    pub priority: String,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of the inbox plus aggregate counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total_count: u64,
    pub unread_count: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Inbox query: page window plus optional read-state and priority
/// filters.
#[derive(Debug, Clone, PartialEq)]
pub struct InboxQuery {
    pub page: u32,
    pub page_size: u32,
    pub unread_only: bool,
    pub priority_filter: Option<String>,
}

impl Default for InboxQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            unread_only: false,
            priority_filter: None,
        }
    }
}

impl InboxQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .set("page", self.page)
            .set("page_size", self.page_size)
            .set("unread_only", self.unread_only)
            .maybe("priority_filter", self.priority_filter.as_deref())
    }
}

/// Aggregate notification counters for the dashboard badge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total_notifications: u64,
    pub unread_count: u64,
    pub critical_count: u64,
    pub upcoming_deadlines_count: u64,
    pub overdue_count: u64,
}

/// Per-channel delivery preferences, keyed by preference name. The
/// backend stores these as an open-ended map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub preferences: serde_json::Map<String, serde_json::Value>,
}

/// Notification center operations.
#[async_trait]
pub trait NotificationsApi: Send + Sync {
    /// Fetch one inbox page, newest first.
    async fn list(&self, query: &InboxQuery) -> ApiResult<NotificationPage>;

    /// Aggregate counters across the whole inbox.
    async fn stats(&self) -> ApiResult<NotificationStats>;

    /// Mark one notification read.
    async fn mark_read(&self, notification_id: Uuid) -> ApiResult<()>;

    /// Mark every notification read.
    async fn mark_all_read(&self) -> ApiResult<()>;

    /// Delete one notification.
    async fn delete(&self, notification_id: Uuid) -> ApiResult<()>;

    /// Fetch delivery preferences.
    async fn preferences(&self) -> ApiResult<NotificationPreferences>;

    /// Replace the given preference entries, leaving others unchanged.
    async fn update_preferences(
        &self,
        preferences: &serde_json::Map<String, serde_json::Value>,
    ) -> ApiResult<()>;
}

pub struct HttpNotificationsApi {
    http: Arc<HttpClient>,
}

impl HttpNotificationsApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NotificationsApi for HttpNotificationsApi {
    async fn list(&self, query: &InboxQuery) -> ApiResult<NotificationPage> {
        self.http
            .get_json_with("/notifications/", &query.to_query())
            .await
    }

    async fn stats(&self) -> ApiResult<NotificationStats> {
        self.http.get_json("/notifications/stats").await
    }

    async fn mark_read(&self, notification_id: Uuid) -> ApiResult<()> {
        self.http
            .patch_empty(&format!("/notifications/{notification_id}/read"))
            .await
    }

    async fn mark_all_read(&self) -> ApiResult<()> {
        self.http.patch_empty("/notifications/read-all").await
    }

    async fn delete(&self, notification_id: Uuid) -> ApiResult<()> {
        self.http
            .delete(&format!("/notifications/{notification_id}"))
            .await
    }

    async fn preferences(&self) -> ApiResult<NotificationPreferences> {
        self.http.get_json("/notifications/preferences").await
    }

    async fn update_preferences(
        &self,
        preferences: &serde_json::Map<String, serde_json::Value>,
    ) -> ApiResult<()> {
        // The server acknowledges with a message body; nothing to keep.
        let _ack: serde_json::Value = self
            .http
            .patch_json("/notifications/preferences", preferences)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use casekit_http::HttpClientConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn api_for(server: &MockServer) -> HttpNotificationsApi {
        let http = HttpClient::new(HttpClientConfig::new(server.base_url())).unwrap();
        HttpNotificationsApi::new(Arc::new(http))
    }

    #[tokio::test]
    async fn inbox_page_decodes_counters() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET)
                .path("/notifications/")
                .query_param("page", "1")
                .query_param("page_size", "20")
                .query_param("unread_only", "true");
            then.status(200).json_body(json!({
                "notifications": [{
                    "notification_id": "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b1001",
                    "user_id": "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b1002",
                    "type": "deadline",
                    "title": "Visa expires in 30 days",
                    "content": null,
                    "priority": "high",
                    "related_entity_type": null,
                    "related_entity_id": null,
                    "scheduled_for": null,
                    "expires_at": null,
                    "is_read": false,
                    "created_at": "2026-01-10T09:00:00Z"
                }],
                "total_count": 12,
                "unread_count": 3,
                "page": 1,
                "page_size": 20
            }));
        });

        let query = InboxQuery {
            unread_only: true,
            ..InboxQuery::default()
        };
        let page = api_for(&server).list(&query).await.unwrap();
        assert_eq!(page.unread_count, 3);
        assert_eq!(page.notifications[0].kind, "deadline");
        assert!(!page.notifications[0].is_read);
    }

    #[tokio::test]
    async fn mark_read_patches_without_body() {
        let server = MockServer::start();
        let id: Uuid = "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b1001".parse().unwrap();
        let mock = server.mock(|when, then| {
            when.method(PATCH).path(format!("/notifications/{id}/read"));
            then.status(200).json_body(json!({"message": "marked as read"}));
        });

        api_for(&server).mark_read(id).await.unwrap();
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn preferences_roundtrip_keeps_open_map() {
        let server = MockServer::start();
        let _get = server.mock(|when, then| {
            when.method(GET).path("/notifications/preferences");
            then.status(200).json_body(json!({
                "preferences": {"email_enabled": true, "digest_frequency": "weekly"}
            }));
        });
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/notifications/preferences")
                .json_body(json!({"email_enabled": false}));
            then.status(200).json_body(json!({"message": "preferences updated"}));
        });

        let api = api_for(&server);
        let prefs = api.preferences().await.unwrap();
        assert_eq!(prefs.preferences["digest_frequency"], "weekly");

        let mut update = serde_json::Map::new();
        update.insert("email_enabled".to_owned(), json!(false));
        api.update_preferences(&update).await.unwrap();
        assert_eq!(patch.calls(), 1);
    }
}
