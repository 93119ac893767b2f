//! Immigration timeline endpoints: events, milestones, deadlines,
//! status history, and the analytics summaries built over them.

use std::sync::Arc;

use async_trait::async_trait;
use casekit_http::{HttpClient, Query};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ApiResult;

/// Well-known event kinds; the backend stores free-form strings, these
/// cover the values it emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Application,
    Interview,
    Decision,
    DocumentRequest,
    Deadline,
    StatusChange,
    Travel,
    Other,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Interview => "interview",
            Self::Decision => "decision",
            Self::DocumentRequest => "document_request",
            Self::Deadline => "deadline",
            Self::StatusChange => "status_change",
            Self::Travel => "travel",
            Self::Other => "other",
        }
    }
}

/// Priority scale shared by events and deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Alert cadence for deadline reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    Daily,
    Weekly,
    Monthly,
}

/// One event on the immigration timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub event_id: String,
    pub profile_id: String,
    pub event_title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_type: String,
    pub event_category: Option<String>,
    pub event_subtype: Option<String>,
    pub priority: Option<String>,
    #[serde(default)]
    pub is_milestone: Option<bool>,
    pub event_status: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reference_table: Option<String>,
    pub document_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineEventCreate {
    pub event_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_milestone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineEventUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_milestone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_status: Option<String>,
}

/// Server-side filter for the event list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub skip: u32,
    pub limit: Option<u32>,
    pub event_type: Option<EventType>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_milestone: Option<bool>,
    pub is_deadline: Option<bool>,
}

impl EventFilter {
    fn to_query(&self) -> Query {
        Query::new()
            .set("skip", self.skip)
            .set("limit", self.limit.unwrap_or(100))
            .maybe("event_type", self.event_type.map(EventType::as_str))
            .maybe("priority", self.priority.map(Priority::as_str))
            .maybe("start_date", self.start_date)
            .maybe("end_date", self.end_date)
            .maybe("is_milestone", self.is_milestone)
            .maybe("is_deadline", self.is_deadline)
    }
}

/// A reusable milestone template for an immigration path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: i64,
    pub milestone_name: String,
    pub description: Option<String>,
    pub immigration_path: String,
    pub category: String,
    pub estimated_days_from_start: Option<i32>,
    pub is_required: bool,
    pub order_sequence: Option<i32>,
    pub completion_criteria: Option<String>,
    #[serde(default)]
    pub required_documents: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A tracked filing or response deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: i64,
    pub user_id: i64,
    pub timeline_event_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub deadline_date: DateTime<Utc>,
    pub deadline_type: String,
    pub priority_level: Priority,
    pub is_completed: bool,
    pub alert_enabled: bool,
    pub alert_days_before: u32,
    pub alert_frequency: AlertFrequency,
    pub completion_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub deadline_date: DateTime<Utc>,
    pub deadline_type: String,
    pub priority_level: Priority,
    pub is_completed: bool,
    pub alert_enabled: bool,
    pub alert_days_before: u32,
    pub alert_frequency: AlertFrequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeadlineUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_level: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_days_before: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_frequency: Option<AlertFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
}

/// A recorded immigration status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: i64,
    pub user_id: i64,
    pub timeline_event_id: Option<i64>,
    pub to_status_id: String,
    pub from_status_id: Option<String>,
    pub status_description: Option<String>,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeCreate {
    pub to_status_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Timeline operations.
#[async_trait]
pub trait TimelineApi: Send + Sync {
    /// List events for a profile, newest first, optionally filtered.
    async fn list_events(&self, filter: &EventFilter) -> ApiResult<Vec<TimelineEvent>>;
    async fn create_event(&self, body: &TimelineEventCreate) -> ApiResult<TimelineEvent>;
    async fn update_event(
        &self,
        event_id: &str,
        body: &TimelineEventUpdate,
    ) -> ApiResult<TimelineEvent>;
    async fn delete_event(&self, event_id: &str) -> ApiResult<()>;

    /// List milestone templates, optionally scoped to one path.
    async fn list_milestones(&self, immigration_path: Option<&str>) -> ApiResult<Vec<Milestone>>;

    /// List deadlines; `upcoming_only` limits to the next `days_ahead` days.
    async fn list_deadlines(&self, upcoming_only: bool, days_ahead: u32)
    -> ApiResult<Vec<Deadline>>;
    async fn create_deadline(&self, body: &DeadlineCreate) -> ApiResult<Deadline>;
    async fn update_deadline(&self, deadline_id: i64, body: &DeadlineUpdate)
    -> ApiResult<Deadline>;
    async fn delete_deadline(&self, deadline_id: i64) -> ApiResult<()>;

    async fn list_status_history(&self, skip: u32, limit: u32) -> ApiResult<Vec<StatusChange>>;
    async fn record_status_change(&self, body: &StatusChangeCreate) -> ApiResult<StatusChange>;

    /// Aggregate counters for the timeline dashboard.
    async fn summary(&self) -> ApiResult<serde_json::Value>;

    /// Progress analytics, optionally scoped to one immigration path.
    async fn progress(&self, immigration_path: Option<&str>) -> ApiResult<serde_json::Value>;
}

pub struct HttpTimelineApi {
    http: Arc<HttpClient>,
}

impl HttpTimelineApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TimelineApi for HttpTimelineApi {
    async fn list_events(&self, filter: &EventFilter) -> ApiResult<Vec<TimelineEvent>> {
        self.http
            .get_json_with("/timeline/events", &filter.to_query())
            .await
    }

    async fn create_event(&self, body: &TimelineEventCreate) -> ApiResult<TimelineEvent> {
        self.http.post_json("/timeline/events", body).await
    }

    async fn update_event(
        &self,
        event_id: &str,
        body: &TimelineEventUpdate,
    ) -> ApiResult<TimelineEvent> {
        self.http
            .put_json(&format!("/timeline/events/{event_id}"), body)
            .await
    }

    async fn delete_event(&self, event_id: &str) -> ApiResult<()> {
        self.http
            .delete(&format!("/timeline/events/{event_id}"))
            .await
    }

    async fn list_milestones(&self, immigration_path: Option<&str>) -> ApiResult<Vec<Milestone>> {
        let query = Query::new().maybe("immigration_path", immigration_path);
        self.http.get_json_with("/timeline/milestones", &query).await
    }

    async fn list_deadlines(
        &self,
        upcoming_only: bool,
        days_ahead: u32,
    ) -> ApiResult<Vec<Deadline>> {
        let query = Query::new()
            .set("upcoming_only", upcoming_only)
            .set("days_ahead", days_ahead);
        self.http.get_json_with("/timeline/deadlines", &query).await
    }

    async fn create_deadline(&self, body: &DeadlineCreate) -> ApiResult<Deadline> {
        self.http.post_json("/timeline/deadlines", body).await
    }

    async fn update_deadline(
        &self,
        deadline_id: i64,
        body: &DeadlineUpdate,
    ) -> ApiResult<Deadline> {
        self.http
            .put_json(&format!("/timeline/deadlines/{deadline_id}"), body)
            .await
    }

    async fn delete_deadline(&self, deadline_id: i64) -> ApiResult<()> {
        self.http
            .delete(&format!("/timeline/deadlines/{deadline_id}"))
            .await
    }

    async fn list_status_history(&self, skip: u32, limit: u32) -> ApiResult<Vec<StatusChange>> {
        let query = Query::new().set("skip", skip).set("limit", limit);
        self.http
            .get_json_with("/timeline/status-history", &query)
            .await
    }

    async fn record_status_change(&self, body: &StatusChangeCreate) -> ApiResult<StatusChange> {
        self.http.post_json("/timeline/status-history", body).await
    }

    async fn summary(&self) -> ApiResult<serde_json::Value> {
        self.http.get_json("/timeline/analytics/summary").await
    }

    async fn progress(&self, immigration_path: Option<&str>) -> ApiResult<serde_json::Value> {
        let query = Query::new().maybe("immigration_path", immigration_path);
        self.http
            .get_json_with("/timeline/analytics/progress", &query)
            .await
    }
}
