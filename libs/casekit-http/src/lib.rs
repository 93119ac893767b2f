#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! HTTP client adapter for the casekit backend API.
//!
//! This crate is the single point of egress for all API calls:
//! - joins request paths onto a configured base URL,
//! - carries the HTTP-only session cookie via an enabled cookie store,
//! - recovers from authentication expiry with a single-flight
//!   `POST /auth/token/refresh` followed by exactly one replay of the
//!   original request,
//! - broadcasts [`AuthEvent::SessionExpired`] when recovery fails so the
//!   embedding application can drop its session state.
//!
//! It also owns the two request serializers the domain modules share: the
//! [`Query`] builder (defined, non-empty fields only) and the
//! [`MultipartPayload`] builder (absent optional parts are omitted, never
//! sent as empty strings).

pub mod client;
pub mod config;
pub mod error;
pub mod multipart;
pub mod query;

pub use client::{AuthEvent, HttpClient};
pub use config::{BASE_URL_ENV, DEFAULT_USER_AGENT, HttpClientConfig};
pub use error::{GENERIC_ERROR_MESSAGE, HttpError};
pub use multipart::MultipartPayload;
pub use query::Query;
pub use reqwest::StatusCode;
