use std::sync::Arc;

use casekit_http::{HttpClient, HttpClientConfig, HttpError};

use crate::auth::{AuthApi, HttpAuthApi};
use crate::chat::{ChatApi, HttpChatApi};
use crate::documents::{DocumentsApi, HttpDocumentsApi};
use crate::history::{HistoryApi, HttpHistoryApi};
use crate::notifications::{HttpNotificationsApi, NotificationsApi};
use crate::profiles::{HttpProfilesApi, ProfilesApi};
use crate::timeline::{HttpTimelineApi, TimelineApi};

/// All backend domains behind one handle.
///
/// Cloning is cheap. Construct with [`CaseApi::new`] for production or
/// assemble from trait objects with [`CaseApi::from_parts`] to inject
/// fakes in tests.
#[derive(Clone)]
pub struct CaseApi {
    http: Arc<HttpClient>,
    pub auth: Arc<dyn AuthApi>,
    pub profiles: Arc<dyn ProfilesApi>,
    pub documents: Arc<dyn DocumentsApi>,
    pub history: Arc<dyn HistoryApi>,
    pub timeline: Arc<dyn TimelineApi>,
    pub notifications: Arc<dyn NotificationsApi>,
    pub chat: Arc<dyn ChatApi>,
}

impl CaseApi {
    /// Build the HTTP-backed API surface over one shared transport.
    ///
    /// # Errors
    /// Fails when the configured base URL is invalid or the transport
    /// cannot be constructed.
    pub fn new(config: HttpClientConfig) -> Result<Self, HttpError> {
        let http = Arc::new(HttpClient::new(config)?);
        Ok(Self {
            auth: Arc::new(HttpAuthApi::new(Arc::clone(&http))),
            profiles: Arc::new(HttpProfilesApi::new(Arc::clone(&http))),
            documents: Arc::new(HttpDocumentsApi::new(Arc::clone(&http))),
            history: Arc::new(HttpHistoryApi::new(Arc::clone(&http))),
            timeline: Arc::new(HttpTimelineApi::new(Arc::clone(&http))),
            notifications: Arc::new(HttpNotificationsApi::new(Arc::clone(&http))),
            chat: Arc::new(HttpChatApi::new(Arc::clone(&http))),
            http,
        })
    }

    /// Assemble a facade from individual domain implementations.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        http: Arc<HttpClient>,
        auth: Arc<dyn AuthApi>,
        profiles: Arc<dyn ProfilesApi>,
        documents: Arc<dyn DocumentsApi>,
        history: Arc<dyn HistoryApi>,
        timeline: Arc<dyn TimelineApi>,
        notifications: Arc<dyn NotificationsApi>,
        chat: Arc<dyn ChatApi>,
    ) -> Self {
        Self {
            http,
            auth,
            profiles,
            documents,
            history,
            timeline,
            notifications,
            chat,
        }
    }

    /// The shared transport, for subscribing to auth events.
    #[must_use]
    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }
}
