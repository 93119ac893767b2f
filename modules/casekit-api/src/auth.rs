//! Auth lifecycle and current-user endpoints.
//!
//! Credentials live in an HTTP-only session cookie managed by the
//! transport; this module only drives the OAuth handshake and exposes
//! the identity the server associates with that cookie.

use std::sync::Arc;

use async_trait::async_trait;
use casekit_http::{HttpClient, Query};
use serde::{Deserialize, Serialize};

use crate::ApiResult;

/// The identity behind the current session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub email_verified: bool,
}

impl UserIdentity {
    /// Display name: full name when known, else the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_owned(),
            (None, Some(last)) => last.to_owned(),
            (None, None) => self.email.clone(),
        }
    }
}

/// Body for `PUT /users/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Account-level settings keyed by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub setting_id: String,
    pub user_id: String,
    pub notification_preferences: std::collections::BTreeMap<String, bool>,
    pub ui_preferences: std::collections::BTreeMap<String, String>,
    pub time_zone: Option<String>,
    pub language_preference: Option<String>,
}

/// Google OAuth entry point: the provider URL to redirect the browser
/// to, plus the anti-forgery state echoed back on the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleAuthUrl {
    pub auth_url: String,
    pub state: String,
}

/// Auth lifecycle operations.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Begin the Google OAuth handshake.
    async fn google_auth_url(&self) -> ApiResult<GoogleAuthUrl>;

    /// Complete the handshake; on success the server sets the session
    /// cookie and returns the signed-in identity.
    async fn google_callback(&self, code: &str, state: &str) -> ApiResult<UserIdentity>;

    /// Invalidate the session cookie server-side.
    async fn logout(&self) -> ApiResult<()>;

    /// Identity behind the current cookie; 401 means no live session.
    async fn me(&self) -> ApiResult<UserIdentity>;

    /// Update the current user's name fields.
    async fn update_me(&self, body: &UserUpdate) -> ApiResult<UserIdentity>;

    /// Fetch account-level settings.
    async fn settings(&self) -> ApiResult<UserSettings>;

    /// Replace account-level settings.
    async fn update_settings(&self, body: &UserSettings) -> ApiResult<UserSettings>;
}

pub struct HttpAuthApi {
    http: Arc<HttpClient>,
}

impl HttpAuthApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn google_auth_url(&self) -> ApiResult<GoogleAuthUrl> {
        self.http.get_json("/auth/google/url").await
    }

    async fn google_callback(&self, code: &str, state: &str) -> ApiResult<UserIdentity> {
        let query = Query::new().set("code", code).set("state", state);
        self.http
            .get_json_with("/auth/google/callback", &query)
            .await
    }

    async fn logout(&self) -> ApiResult<()> {
        self.http.post_ack("/auth/logout").await
    }

    async fn me(&self) -> ApiResult<UserIdentity> {
        self.http.get_json("/users/me").await
    }

    async fn update_me(&self, body: &UserUpdate) -> ApiResult<UserIdentity> {
        self.http.put_json("/users/me", body).await
    }

    async fn settings(&self) -> ApiResult<UserSettings> {
        self.http.get_json("/users/me/settings").await
    }

    async fn update_settings(&self, body: &UserSettings) -> ApiResult<UserSettings> {
        self.http.put_json("/users/me/settings", body).await
    }
}
