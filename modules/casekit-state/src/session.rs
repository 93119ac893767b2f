//! Session resolution and the cached identity snapshot.
//!
//! The server-side cookie is the source of truth. The local snapshot
//! only buys an instant authenticated render on reload; any later 401
//! that survives the transport's refresh-and-replay invalidates it
//! through [`AuthEvent::SessionExpired`].

use std::path::PathBuf;
use std::sync::Arc;

use casekit_api::auth::{AuthApi, UserIdentity};
use casekit_http::{AuthEvent, HttpError};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// How the current session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Google,
    Password,
}

/// Where session resolution currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Unknown,
    Checking,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<UserIdentity>,
    pub auth_method: Option<AuthMethod>,
    pub phase: SessionPhase,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }
}

/// The advisory identity snapshot persisted across reloads.
///
/// `auth_method` is only known when the session was established through
/// a login observed by this client; a session merely verified against
/// the current-user endpoint carries `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub identity: UserIdentity,
    #[serde(default)]
    pub auth_method: Option<AuthMethod>,
}

/// Persistence seam for the snapshot. Implementations swallow their own
/// storage errors: a missing or unreadable snapshot is simply absent.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Option<SessionSnapshot>;
    fn save(&self, snapshot: &SessionSnapshot);
    fn clear(&self);
}

/// In-memory snapshot store for tests and ephemeral embedders.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<SessionSnapshot>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Option<SessionSnapshot> {
        self.snapshot.lock().clone()
    }

    fn save(&self, snapshot: &SessionSnapshot) {
        *self.snapshot.lock() = Some(snapshot.clone());
    }

    fn clear(&self) {
        *self.snapshot.lock() = None;
    }
}

/// JSON-file snapshot store for desktop embedders.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Option<SessionSnapshot> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                tracing::debug!(%error, path = %self.path.display(), "ignoring unreadable session snapshot");
                None
            }
        }
    }

    fn save(&self, snapshot: &SessionSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(raw) => {
                if let Err(error) = std::fs::write(&self.path, raw) {
                    tracing::warn!(%error, path = %self.path.display(), "failed to persist session snapshot");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to serialize session snapshot"),
        }
    }

    fn clear(&self) {
        if let Err(error) = std::fs::remove_file(&self.path)
            && error.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(%error, path = %self.path.display(), "failed to clear session snapshot");
        }
    }
}

/// Resolves authentication once per app start and keeps session state
/// consistent with server-side cookie validity.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    snapshots: Arc<dyn SnapshotStore>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            api,
            snapshots,
            state: RwLock::new(SessionState::default()),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Resolve the session on app start.
    ///
    /// With a cached snapshot the session is trusted optimistically for
    /// an immediate authenticated render; the transport's 401 handling
    /// remains the final authority. Without one, the current-user
    /// endpoint decides.
    pub async fn resolve(&self) -> SessionState {
        if let Some(snapshot) = self.snapshots.load() {
            let mut state = self.state.write();
            state.identity = Some(snapshot.identity);
            state.auth_method = snapshot.auth_method;
            state.phase = SessionPhase::Authenticated;
            return state.clone();
        }

        self.state.write().phase = SessionPhase::Checking;
        match self.api.me().await {
            Ok(identity) => {
                // The current-user endpoint proves the cookie is live but
                // says nothing about how it was established.
                self.snapshots.save(&SessionSnapshot {
                    identity: identity.clone(),
                    auth_method: None,
                });
                let mut state = self.state.write();
                state.identity = Some(identity);
                state.auth_method = None;
                state.phase = SessionPhase::Authenticated;
            }
            Err(error) => {
                tracing::debug!(%error, "no live session");
                let mut state = self.state.write();
                state.identity = None;
                state.auth_method = None;
                state.phase = SessionPhase::Unauthenticated;
            }
        }
        self.state()
    }

    /// Record a completed login.
    pub fn login_succeeded(&self, identity: UserIdentity, method: AuthMethod) {
        self.snapshots.save(&SessionSnapshot {
            identity: identity.clone(),
            auth_method: Some(method),
        });
        let mut state = self.state.write();
        state.identity = Some(identity);
        state.auth_method = Some(method);
        state.phase = SessionPhase::Authenticated;
    }

    /// Invalidate the session server-side and clear local state. Local
    /// state clears even when the server call fails; the cookie is then
    /// dead weight the server will reject anyway.
    pub async fn logout(&self) -> Result<(), HttpError> {
        let result = self.api.logout().await;
        self.clear_session();
        result
    }

    /// React to a session-expiry event from the transport.
    pub fn handle_session_expired(&self) {
        tracing::warn!("session expired; clearing cached identity");
        self.clear_session();
    }

    fn clear_session(&self) {
        self.snapshots.clear();
        let mut state = self.state.write();
        state.identity = None;
        state.auth_method = None;
        state.phase = SessionPhase::Unauthenticated;
    }

    /// Watch the transport's auth events until the channel closes,
    /// clearing the session whenever expiry is announced.
    pub fn spawn_expiry_watcher(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<AuthEvent>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::SessionExpired) => manager.handle_session_expired(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "auth event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
