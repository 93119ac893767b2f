//! Typed API surface for the casekit backend.
//!
//! One module per backend domain, each exposing a trait describing its
//! endpoints plus the HTTP-backed implementation. The [`CaseApi`] facade
//! bundles every domain behind `Arc<dyn …>` handles so the state layer
//! and tests can swap in fakes at the trait seam.
//!
//! All implementations share a single [`casekit_http::HttpClient`], so
//! session-cookie handling and 401 recovery are uniform across domains.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod auth;
pub mod chat;
pub mod documents;
pub mod history;
pub mod notifications;
pub mod profiles;
pub mod timeline;

mod facade;

pub use facade::CaseApi;

/// Convenience alias for API call results.
pub type ApiResult<T> = Result<T, casekit_http::HttpError>;
