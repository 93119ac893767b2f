//! Per-slice request bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};

use casekit_http::HttpError;

/// Loading flag and last error for one slice.
///
/// The error string is ready for direct display: server detail messages
/// pass through verbatim, everything else collapses to a generic
/// message. An error never clears previously fetched data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLifecycle {
    pub loading: bool,
    pub error: Option<String>,
}

impl RequestLifecycle {
    /// Mark a request in flight and clear any stale error.
    pub fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Mark the in-flight request settled successfully.
    pub fn finish(&mut self) {
        self.loading = false;
    }

    /// Record a failed request.
    pub fn fail(&mut self, error: &HttpError) {
        self.loading = false;
        self.error = Some(error.user_message());
    }

    /// Dismiss the error banner before a retry.
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Monotonic ticket counter guarding one fetched collection.
///
/// Each fetch takes a ticket before dispatching; the response is applied
/// only if no later ticket was issued meanwhile. A superseded response
/// is dropped, so out-of-order arrivals cannot overwrite fresher data.
#[derive(Debug, Default)]
pub struct FetchGate(AtomicU64);

impl FetchGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next ticket, superseding all earlier ones.
    pub fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Whether `ticket` is still the latest issued.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::Acquire) == ticket
    }
}
