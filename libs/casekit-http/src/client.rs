//! The HTTP client adapter: single point of egress for all API calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::{HttpError, extract_detail};
use crate::multipart::MultipartPayload;
use crate::query::Query;

/// Path of the cookie re-establishment endpoint.
const REFRESH_PATH: &str = "/auth/token/refresh";

/// Capacity of the auth event channel; events are rare and tiny.
const AUTH_EVENT_CAPACITY: usize = 16;

/// Authentication lifecycle events emitted by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The session cookie expired and could not be re-established. The
    /// embedding application should clear its session snapshot and route
    /// the user to the login entry point.
    SessionExpired,
}

/// Refresh coordination state shared by all in-flight requests.
///
/// The generation counter lets a request that lost the race for the lock
/// detect that another request already refreshed the session while it
/// waited, so the refresh endpoint is called at most once per expiry.
struct RefreshGate {
    lock: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

impl RefreshGate {
    fn new() -> Self {
        Self {
            lock: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// Request body variants the adapter can replay after a refresh.
enum Payload<'a> {
    Empty,
    Json(serde_json::Value),
    Multipart(&'a MultipartPayload),
}

/// HTTP client for the casekit backend.
///
/// Credentials are cookie-based: the underlying `reqwest` cookie store
/// carries the HTTP-only session cookie, and the adapter never sees a
/// client-visible token. On a 401 from any non-auth path the adapter
/// performs a single-flight `POST /auth/token/refresh` and replays the
/// original request exactly once before surfacing failure.
///
/// Cloning is cheap; clones share the cookie store, connection pool,
/// refresh gate, and auth event channel.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Url,
    refresh: Arc<RefreshGate>,
    auth_tx: broadcast::Sender<AuthEvent>,
}

impl HttpClient {
    /// Create a client for the configured API origin.
    ///
    /// # Errors
    /// Returns [`HttpError::InvalidUrl`] if the base URL does not parse,
    /// or [`HttpError::Transport`] if the TLS backend fails to initialize.
    pub fn new(config: HttpClientConfig) -> Result<Self, HttpError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| HttpError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let inner = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(HttpError::Transport)?;

        let (auth_tx, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Ok(Self {
            inner,
            base_url,
            refresh: Arc::new(RefreshGate::new()),
            auth_tx,
        })
    }

    /// The configured API origin.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Subscribe to authentication lifecycle events.
    #[must_use]
    pub fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_tx.subscribe()
    }

    /// `GET` a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let response = self.send(Method::GET, path, None, Payload::Empty).await?;
        Self::read_json(response).await
    }

    /// `GET` a JSON resource with query parameters.
    pub async fn get_json_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<T, HttpError> {
        let response = self
            .send(Method::GET, path, Some(query), Payload::Empty)
            .await?;
        Self::read_json(response).await
    }

    /// `GET` an opaque binary body (document download, list export).
    pub async fn get_bytes(&self, path: &str, query: &Query) -> Result<Bytes, HttpError> {
        let response = self
            .send(Method::GET, path, Some(query), Payload::Empty)
            .await?;
        Self::read_bytes(response).await
    }

    /// `POST` a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self
            .send(Method::POST, path, None, Payload::Json(body))
            .await?;
        Self::read_json(response).await
    }

    /// `POST` with no body (action triggers such as OCR extraction).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let response = self.send(Method::POST, path, None, Payload::Empty).await?;
        Self::read_json(response).await
    }

    /// `POST` a multipart form (file upload).
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &MultipartPayload,
    ) -> Result<T, HttpError> {
        let response = self
            .send(Method::POST, path, None, Payload::Multipart(payload))
            .await?;
        Self::read_json(response).await
    }

    /// `PUT` a JSON body and decode a JSON response.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self
            .send(Method::PUT, path, None, Payload::Json(body))
            .await?;
        Self::read_json(response).await
    }

    /// `PATCH` a JSON body and decode a JSON response.
    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self
            .send(Method::PATCH, path, None, Payload::Json(body))
            .await?;
        Self::read_json(response).await
    }

    /// `PATCH` with no body, discarding the acknowledgement payload.
    pub async fn patch_empty(&self, path: &str) -> Result<(), HttpError> {
        let response = self.send(Method::PATCH, path, None, Payload::Empty).await?;
        Self::expect_success(response).await
    }

    /// `POST` with no body, discarding the acknowledgement payload.
    pub async fn post_ack(&self, path: &str) -> Result<(), HttpError> {
        let response = self.send(Method::POST, path, None, Payload::Empty).await?;
        Self::expect_success(response).await
    }

    /// `DELETE` a resource, discarding the acknowledgement payload.
    pub async fn delete(&self, path: &str) -> Result<(), HttpError> {
        let response = self
            .send(Method::DELETE, path, None, Payload::Empty)
            .await?;
        Self::expect_success(response).await
    }

    /// Send a request, recovering once from authentication expiry.
    ///
    /// At most one replay per original request: a 401 on the replayed
    /// request is terminal and emits [`AuthEvent::SessionExpired`].
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&Query>,
        payload: Payload<'_>,
    ) -> Result<reqwest::Response, HttpError> {
        let observed = self.refresh.generation();
        let response = self.dispatch(method.clone(), path, query, &payload).await?;

        if response.status() != StatusCode::UNAUTHORIZED || is_auth_path(path) {
            return Ok(response);
        }

        tracing::debug!(path, "received 401, attempting session refresh");
        self.reauthenticate(observed).await?;

        let replayed = self.dispatch(method, path, query, &payload).await?;
        if replayed.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "request still unauthorized after refresh");
            self.notify_session_expired();
            return Err(HttpError::SessionExpired);
        }
        Ok(replayed)
    }

    /// Build and execute one request attempt.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: Option<&Query>,
        payload: &Payload<'_>,
    ) -> Result<reqwest::Response, HttpError> {
        let url = self.join(path)?;
        let mut builder = self.inner.request(method, url);

        if let Some(query) = query
            && !query.is_empty()
        {
            builder = builder.query(query.pairs());
        }

        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Multipart(payload) => builder.multipart(payload.to_form()?),
        };

        builder.send().await.map_err(HttpError::from_reqwest)
    }

    /// Re-establish the session cookie, single-flight.
    ///
    /// `observed` is the refresh generation the caller saw before its
    /// request; when the stored generation has already moved past it,
    /// another request refreshed the session while this one waited and no
    /// second refresh call is issued.
    async fn reauthenticate(&self, observed: u64) -> Result<(), HttpError> {
        let _guard = self.refresh.lock.lock().await;

        if self.refresh.generation() != observed {
            return Ok(());
        }

        let url = self.join(REFRESH_PATH)?;
        let response = self
            .inner
            .post(url)
            .send()
            .await
            .map_err(HttpError::from_reqwest)?;

        if response.status().is_success() {
            self.refresh.bump();
            tracing::debug!("session refresh succeeded");
            Ok(())
        } else {
            tracing::warn!(status = %response.status(), "session refresh failed");
            self.notify_session_expired();
            Err(HttpError::SessionExpired)
        }
    }

    fn notify_session_expired(&self) {
        // No receivers is fine; the event is advisory.
        let _ = self.auth_tx.send(AuthEvent::SessionExpired);
    }

    /// Join a request path onto the base URL, preserving the base path
    /// segment (e.g. `/api/v1`).
    fn join(&self, path: &str) -> Result<Url, HttpError> {
        let mut raw = self.base_url.as_str().trim_end_matches('/').to_owned();
        if !path.starts_with('/') {
            raw.push('/');
        }
        raw.push_str(path);
        Url::parse(&raw).map_err(|e| HttpError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    /// Decode a JSON body, mapping non-2xx statuses to [`HttpError::Status`]
    /// with the server's `detail` message when one was provided.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, HttpError> {
        let status = response.status();
        let body = response.text().await.map_err(HttpError::from_reqwest)?;
        if !status.is_success() {
            return Err(HttpError::Status {
                status,
                detail: extract_detail(&body),
            });
        }
        serde_json::from_str(&body).map_err(HttpError::from)
    }

    /// Read an opaque binary body.
    async fn read_bytes(response: reqwest::Response) -> Result<Bytes, HttpError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                status,
                detail: extract_detail(&body),
            });
        }
        response.bytes().await.map_err(HttpError::from_reqwest)
    }

    /// Check the status and discard the body.
    async fn expect_success(response: reqwest::Response) -> Result<(), HttpError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(HttpError::Status {
            status,
            detail: extract_detail(&body),
        })
    }
}

/// Auth endpoints never trigger the refresh-and-replay path; a 401 from
/// login or refresh itself is a terminal answer, not an expired session.
fn is_auth_path(path: &str) -> bool {
    path.trim_start_matches('/').starts_with("auth/")
}
