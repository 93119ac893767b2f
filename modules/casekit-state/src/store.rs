//! The state container: every domain slice plus the session manager
//! behind one injectable value.

use std::sync::Arc;

use casekit_api::CaseApi;

use crate::session::{MemorySnapshotStore, SessionManager, SnapshotStore};
use crate::slices::{
    ChatSlice, DocumentsSlice, HistorySlice, NotificationsSlice, ProfilesSlice, TimelineSlice,
};

/// All domain slices and the session manager for one session.
///
/// Not a global: tests and embedders construct as many isolated stores
/// as they need, each wired to its own [`CaseApi`]. Reads go through
/// slice snapshots and the selector functions; writes happen only
/// inside slice actions when the server confirms a result.
pub struct Store {
    pub profiles: ProfilesSlice,
    pub documents: DocumentsSlice,
    pub history: HistorySlice,
    pub timeline: TimelineSlice,
    pub notifications: NotificationsSlice,
    pub chat: ChatSlice,
    pub session: Arc<SessionManager>,
}

impl Store {
    /// Build a store with an in-memory session snapshot; nothing
    /// survives a restart. Desktop embedders that want reload-to-reload
    /// continuity use [`Store::with_snapshot_store`].
    #[must_use]
    pub fn new(api: &CaseApi) -> Self {
        Self::with_snapshot_store(api, Arc::new(MemorySnapshotStore::new()))
    }

    #[must_use]
    pub fn with_snapshot_store(api: &CaseApi, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            profiles: ProfilesSlice::new(api.profiles.clone()),
            documents: DocumentsSlice::new(api.documents.clone()),
            history: HistorySlice::new(api.history.clone()),
            timeline: TimelineSlice::new(api.timeline.clone()),
            notifications: NotificationsSlice::new(api.notifications.clone()),
            chat: ChatSlice::new(api.chat.clone()),
            session: Arc::new(SessionManager::new(api.auth.clone(), snapshots)),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::session::{AuthMethod, SessionPhase, SessionSnapshot};
    use casekit_api::auth::UserIdentity;
    use casekit_http::HttpClientConfig;

    fn api() -> CaseApi {
        CaseApi::new(HttpClientConfig::new("http://localhost:9")).unwrap()
    }

    #[test]
    fn store_owns_an_unresolved_session_manager() {
        let store = Store::new(&api());
        assert_eq!(store.session.state().phase, SessionPhase::Unknown);
    }

    #[tokio::test]
    async fn injected_snapshot_store_feeds_session_resolution() {
        let snapshots = Arc::new(MemorySnapshotStore::new());
        snapshots.save(&SessionSnapshot {
            identity: UserIdentity {
                user_id: "u1".to_owned(),
                email: "ada@example.com".to_owned(),
                first_name: None,
                last_name: None,
                is_active: true,
                email_verified: true,
            },
            auth_method: Some(AuthMethod::Google),
        });

        let store = Store::with_snapshot_store(&api(), snapshots);
        let state = store.session.resolve().await;

        assert!(state.is_authenticated());
        assert_eq!(state.auth_method, Some(AuthMethod::Google));
    }
}
