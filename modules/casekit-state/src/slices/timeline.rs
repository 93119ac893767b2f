//! Timeline slice: events, deadlines, and status history.
//!
//! Events render newest first, so a confirmed create is prepended.
//! Deadline and status-history lists keep server order and append.

use std::sync::Arc;

use casekit_api::timeline::{
    Deadline, DeadlineCreate, DeadlineUpdate, EventFilter, StatusChange, StatusChangeCreate,
    TimelineApi, TimelineEvent, TimelineEventCreate, TimelineEventUpdate,
};
use casekit_http::HttpError;
use parking_lot::RwLock;

use crate::lifecycle::{FetchGate, RequestLifecycle};

#[derive(Debug, Clone, Default)]
pub struct TimelineState {
    pub events: Vec<TimelineEvent>,
    pub deadlines: Vec<Deadline>,
    pub status_history: Vec<StatusChange>,
    pub lifecycle: RequestLifecycle,
}

pub struct TimelineSlice {
    api: Arc<dyn TimelineApi>,
    state: RwLock<TimelineState>,
    events_gate: FetchGate,
    deadlines_gate: FetchGate,
    status_gate: FetchGate,
}

impl TimelineSlice {
    #[must_use]
    pub fn new(api: Arc<dyn TimelineApi>) -> Self {
        Self {
            api,
            state: RwLock::new(TimelineState::default()),
            events_gate: FetchGate::new(),
            deadlines_gate: FetchGate::new(),
            status_gate: FetchGate::new(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> TimelineState {
        self.state.read().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().lifecycle.clear_error();
    }

    pub async fn fetch_events(&self, filter: &EventFilter) -> Result<(), HttpError> {
        let ticket = self.events_gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list_events(filter).await {
            Ok(events) => {
                let mut state = self.state.write();
                if self.events_gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.events = events;
                } else {
                    tracing::debug!("discarding superseded timeline event response");
                }
                Ok(())
            }
            Err(error) => {
                if self.events_gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    /// Create an event; prepended so the newest entry leads the list.
    pub async fn create_event(&self, body: &TimelineEventCreate) -> Result<TimelineEvent, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.create_event(body).await {
            Ok(event) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.events.insert(0, event.clone());
                Ok(event)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn update_event(
        &self,
        event_id: &str,
        body: &TimelineEventUpdate,
    ) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update_event(event_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state
                    .events
                    .iter_mut()
                    .find(|e| e.event_id == updated.event_id)
                {
                    *slot = updated;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete_event(event_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.events.retain(|e| e.event_id != event_id);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn fetch_deadlines(
        &self,
        upcoming_only: bool,
        days_ahead: u32,
    ) -> Result<(), HttpError> {
        let ticket = self.deadlines_gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list_deadlines(upcoming_only, days_ahead).await {
            Ok(deadlines) => {
                let mut state = self.state.write();
                if self.deadlines_gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.deadlines = deadlines;
                } else {
                    tracing::debug!("discarding superseded deadline list response");
                }
                Ok(())
            }
            Err(error) => {
                if self.deadlines_gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    pub async fn create_deadline(&self, body: &DeadlineCreate) -> Result<Deadline, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.create_deadline(body).await {
            Ok(deadline) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.deadlines.push(deadline.clone());
                Ok(deadline)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn update_deadline(
        &self,
        deadline_id: i64,
        body: &DeadlineUpdate,
    ) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update_deadline(deadline_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state.deadlines.iter_mut().find(|d| d.id == updated.id) {
                    *slot = updated;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn delete_deadline(&self, deadline_id: i64) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete_deadline(deadline_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.deadlines.retain(|d| d.id != deadline_id);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn fetch_status_history(&self, skip: u32, limit: u32) -> Result<(), HttpError> {
        let ticket = self.status_gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list_status_history(skip, limit).await {
            Ok(entries) => {
                let mut state = self.state.write();
                if self.status_gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.status_history = entries;
                } else {
                    tracing::debug!("discarding superseded status history response");
                }
                Ok(())
            }
            Err(error) => {
                if self.status_gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    pub async fn record_status_change(
        &self,
        body: &StatusChangeCreate,
    ) -> Result<StatusChange, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.record_status_change(body).await {
            Ok(change) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.status_history.push(change.clone());
                Ok(change)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use casekit_api::ApiResult;
    use casekit_api::timeline::Milestone;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Double that confirms event creates with sequential server ids;
    /// everything else is unreachable.
    #[derive(Default)]
    struct CreateOnlyTimeline {
        next_id: AtomicU64,
    }

    #[async_trait]
    impl TimelineApi for CreateOnlyTimeline {
        async fn list_events(&self, _filter: &EventFilter) -> ApiResult<Vec<TimelineEvent>> {
            Ok(Vec::new())
        }

        async fn create_event(&self, body: &TimelineEventCreate) -> ApiResult<TimelineEvent> {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(TimelineEvent {
                event_id: format!("evt-{n}"),
                profile_id: "profile-1".to_owned(),
                event_title: body.event_title.clone(),
                description: body.description.clone(),
                event_date: body.event_date,
                event_type: body.event_type.clone(),
                event_category: None,
                event_subtype: None,
                priority: body.priority.clone(),
                is_milestone: body.is_milestone,
                event_status: None,
                reference_id: None,
                reference_table: None,
                document_id: None,
                created_at: Utc::now(),
                updated_at: None,
            })
        }

        async fn update_event(
            &self,
            _event_id: &str,
            _body: &TimelineEventUpdate,
        ) -> ApiResult<TimelineEvent> {
            unreachable!("not exercised")
        }

        async fn delete_event(&self, _event_id: &str) -> ApiResult<()> {
            unreachable!("not exercised")
        }

        async fn list_milestones(
            &self,
            _immigration_path: Option<&str>,
        ) -> ApiResult<Vec<Milestone>> {
            unreachable!("not exercised")
        }

        async fn list_deadlines(
            &self,
            _upcoming_only: bool,
            _days_ahead: u32,
        ) -> ApiResult<Vec<Deadline>> {
            unreachable!("not exercised")
        }

        async fn create_deadline(&self, _body: &DeadlineCreate) -> ApiResult<Deadline> {
            unreachable!("not exercised")
        }

        async fn update_deadline(
            &self,
            _deadline_id: i64,
            _body: &DeadlineUpdate,
        ) -> ApiResult<Deadline> {
            unreachable!("not exercised")
        }

        async fn delete_deadline(&self, _deadline_id: i64) -> ApiResult<()> {
            unreachable!("not exercised")
        }

        async fn list_status_history(&self, _skip: u32, _limit: u32) -> ApiResult<Vec<StatusChange>> {
            unreachable!("not exercised")
        }

        async fn record_status_change(
            &self,
            _body: &StatusChangeCreate,
        ) -> ApiResult<StatusChange> {
            unreachable!("not exercised")
        }

        async fn summary(&self) -> ApiResult<serde_json::Value> {
            unreachable!("not exercised")
        }

        async fn progress(&self, _immigration_path: Option<&str>) -> ApiResult<serde_json::Value> {
            unreachable!("not exercised")
        }
    }

    /// Events render newest first, so each confirmed create must land at
    /// the head of the list.
    #[tokio::test]
    async fn created_events_lead_the_list() {
        let slice = TimelineSlice::new(Arc::new(CreateOnlyTimeline::default()));

        for title in ["petition filed", "biometrics", "interview"] {
            let body = TimelineEventCreate {
                event_title: title.to_owned(),
                event_date: Utc::now(),
                event_type: "case_update".to_owned(),
                ..TimelineEventCreate::default()
            };
            slice.create_event(&body).await.unwrap();
        }

        let titles: Vec<String> = slice
            .snapshot()
            .events
            .iter()
            .map(|e| e.event_title.clone())
            .collect();
        assert_eq!(titles, ["interview", "biometrics", "petition filed"]);
    }
}
