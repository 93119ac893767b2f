//! Notifications slice: the paginated inbox with its unread counters.
//!
//! Read-state changes adjust the cached counters locally so the badge
//! updates without a refetch; the next fetch replaces everything with
//! server truth anyway.

use std::sync::Arc;

use casekit_api::notifications::{
    InboxQuery, Notification, NotificationStats, NotificationsApi,
};
use casekit_http::HttpError;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::lifecycle::{FetchGate, RequestLifecycle};

#[derive(Debug, Clone, Default)]
pub struct NotificationsState {
    pub notifications: Vec<Notification>,
    pub total_count: u64,
    pub unread_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub stats: Option<NotificationStats>,
    pub lifecycle: RequestLifecycle,
}

pub struct NotificationsSlice {
    api: Arc<dyn NotificationsApi>,
    state: RwLock<NotificationsState>,
    gate: FetchGate,
}

impl NotificationsSlice {
    #[must_use]
    pub fn new(api: Arc<dyn NotificationsApi>) -> Self {
        Self {
            api,
            state: RwLock::new(NotificationsState::default()),
            gate: FetchGate::new(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> NotificationsState {
        self.state.read().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().lifecycle.clear_error();
    }

    /// Replace the inbox page and counters with the server's view.
    pub async fn fetch(&self, query: &InboxQuery) -> Result<(), HttpError> {
        let ticket = self.gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list(query).await {
            Ok(page) => {
                let mut state = self.state.write();
                if self.gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.notifications = page.notifications;
                    state.total_count = page.total_count;
                    state.unread_count = page.unread_count;
                    state.page = page.page;
                    state.page_size = page.page_size;
                } else {
                    tracing::debug!("discarding superseded inbox response");
                }
                Ok(())
            }
            Err(error) => {
                if self.gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    pub async fn fetch_stats(&self) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.stats().await {
            Ok(stats) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.stats = Some(stats);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Mark one notification read; the cached unread counter follows.
    pub async fn mark_read(&self, notification_id: Uuid) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.mark_read(notification_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(notification) = state
                    .notifications
                    .iter_mut()
                    .find(|n| n.notification_id == notification_id)
                    && !notification.is_read
                {
                    notification.is_read = true;
                    state.unread_count = state.unread_count.saturating_sub(1);
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn mark_all_read(&self) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.mark_all_read().await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                for notification in &mut state.notifications {
                    notification.is_read = true;
                }
                state.unread_count = 0;
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Delete a notification after server confirmation, keeping the
    /// counters consistent with the removal.
    pub async fn delete(&self, notification_id: Uuid) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete(notification_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                let removed_unread = state
                    .notifications
                    .iter()
                    .find(|n| n.notification_id == notification_id)
                    .is_some_and(|n| !n.is_read);
                let before = state.notifications.len();
                state
                    .notifications
                    .retain(|n| n.notification_id != notification_id);
                if state.notifications.len() < before {
                    state.total_count = state.total_count.saturating_sub(1);
                    if removed_unread {
                        state.unread_count = state.unread_count.saturating_sub(1);
                    }
                }
                Ok(())
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
    use casekit_api::notifications::NotificationPage;
    use chrono::Utc;

    fn notification(id: Uuid, read: bool) -> Notification {
        Notification {
            notification_id: id,
            user_id: Uuid::new_v4(),
            kind: "deadline".to_owned(),
            title: "Visa expires soon".to_owned(),
            content: None,
            priority: "high".to_owned(),
            related_entity_type: None,
            related_entity_id: None,
            scheduled_for: None,
            expires_at: None,
            is_read: read,
            created_at: Utc::now(),
        }
    }

    /// Double that serves one fixed page; mutations acknowledge or time
    /// out depending on `fail_mutations`.
    struct FixedInbox {
        page: NotificationPage,
        fail_mutations: bool,
    }

    impl FixedInbox {
        fn ack(&self) -> ApiResult<()> {
            if self.fail_mutations {
                Err(HttpError::Timeout)
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl NotificationsApi for FixedInbox {
        async fn list(&self, _query: &InboxQuery) -> ApiResult<NotificationPage> {
            Ok(self.page.clone())
        }
        async fn stats(&self) -> ApiResult<NotificationStats> {
            Ok(NotificationStats::default())
        }
        async fn mark_read(&self, _id: Uuid) -> ApiResult<()> {
            self.ack()
        }
        async fn mark_all_read(&self) -> ApiResult<()> {
            self.ack()
        }
        async fn delete(&self, _id: Uuid) -> ApiResult<()> {
            self.ack()
        }
        async fn preferences(
            &self,
        ) -> ApiResult<casekit_api::notifications::NotificationPreferences> {
            unreachable!("not exercised")
        }
        async fn update_preferences(
            &self,
            _preferences: &serde_json::Map<String, serde_json::Value>,
        ) -> ApiResult<()> {
            unreachable!("not exercised")
        }
    }

    fn populated_slice() -> (NotificationsSlice, Uuid, Uuid) {
        let unread = Uuid::new_v4();
        let read = Uuid::new_v4();
        let page = NotificationPage {
            notifications: vec![notification(unread, false), notification(read, true)],
            total_count: 2,
            unread_count: 1,
            page: 1,
            page_size: 20,
        };
        (
            NotificationsSlice::new(Arc::new(FixedInbox {
                page,
                fail_mutations: false,
            })),
            unread,
            read,
        )
    }

    #[tokio::test]
    async fn mark_read_decrements_the_badge_once() {
        let (slice, unread, _) = populated_slice();
        slice.fetch(&InboxQuery::default()).await.unwrap();
        assert_eq!(slice.snapshot().unread_count, 1);

        slice.mark_read(unread).await.unwrap();
        let state = slice.snapshot();
        assert_eq!(state.unread_count, 0);
        assert!(state.notifications.iter().all(|n| n.is_read));

        // Marking an already-read notification keeps the counter at
        // zero.
        slice.mark_read(unread).await.unwrap();
        assert_eq!(slice.snapshot().unread_count, 0);
    }

    /// Read-state mutations run through the same pending→settled
    /// lifecycle as every other action: success leaves no banner, a
    /// rejection records one and drops the loading flag.
    #[tokio::test]
    async fn mutations_settle_the_lifecycle() {
        let (slice, unread, _) = populated_slice();
        slice.mark_read(unread).await.unwrap();
        let state = slice.snapshot();
        assert!(!state.lifecycle.loading);
        assert_eq!(state.lifecycle.error, None);

        let failing = NotificationsSlice::new(Arc::new(FixedInbox {
            page: NotificationPage {
                notifications: Vec::new(),
                total_count: 0,
                unread_count: 0,
                page: 1,
                page_size: 20,
            },
            fail_mutations: true,
        }));
        assert!(failing.mark_read(unread).await.is_err());
        let state = failing.snapshot();
        assert!(!state.lifecycle.loading);
        assert!(state.lifecycle.error.is_some());
    }

    #[tokio::test]
    async fn delete_adjusts_both_counters() {
        let (slice, unread, read) = populated_slice();
        slice.fetch(&InboxQuery::default()).await.unwrap();

        slice.delete(unread).await.unwrap();
        let state = slice.snapshot();
        assert_eq!(state.total_count, 1);
        assert_eq!(state.unread_count, 0);

        slice.delete(read).await.unwrap();
        let state = slice.snapshot();
        assert_eq!(state.total_count, 0);
        assert!(state.notifications.is_empty());
    }
}
