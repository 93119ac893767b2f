//! Client-side state container for casekit.
//!
//! One slice per backend domain holds the authoritative in-memory copy
//! of that domain's data. Slices apply server-confirmed results only:
//! a pending create, update, or delete does not touch state until the
//! backend acknowledges it. Fetches are tagged with a per-collection
//! sequence number so a slow, superseded response is discarded instead
//! of clobbering fresher data.
//!
//! Selectors in [`selectors`] derive read-only views (search, expiry
//! classification, badge counts) from slice snapshots. The
//! [`session::SessionManager`] resolves authentication once per app
//! start and reacts to session-expiry events from the transport.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod lifecycle;
pub mod selectors;
pub mod session;
pub mod slices;
pub mod store;

pub use lifecycle::{FetchGate, RequestLifecycle};
pub use store::Store;
