//! Pure projections over slice snapshots.
//!
//! Recomputed on every read from the live collections; nothing here is
//! memoized or stateful.

use casekit_api::documents::Document;
use casekit_api::profiles::Profile;
use casekit_api::timeline::Deadline;
use chrono::NaiveDate;

use crate::slices::notifications::NotificationsState;

/// Days ahead of today's date within which an expiry counts as "soon".
pub const EXPIRY_SOON_DAYS: i64 = 30;

/// Expiry classification for a dated credential or document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Normal,
}

/// Classify an optional expiry date relative to `today`. An absent date
/// is neither expired nor expiring.
#[must_use]
pub fn classify_expiry(expiry: Option<NaiveDate>, today: NaiveDate) -> Option<ExpiryStatus> {
    let date = expiry?;
    let status = if date < today {
        ExpiryStatus::Expired
    } else if (date - today).num_days() < EXPIRY_SOON_DAYS {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Normal
    };
    Some(status)
}

/// Signed day count from `today` to `date`; negative once passed.
#[must_use]
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

fn matches_term(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Case-insensitive substring search over a document's text fields:
/// type, number, file name, issuing authority, and tags. An empty term
/// matches everything.
#[must_use]
pub fn search_documents<'a>(documents: &'a [Document], term: &str) -> Vec<&'a Document> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return documents.iter().collect();
    }
    documents
        .iter()
        .filter(|d| {
            matches_term(&d.document_type, &needle)
                || d.document_number
                    .as_deref()
                    .is_some_and(|n| matches_term(n, &needle))
                || matches_term(&d.file_name, &needle)
                || d.issuing_authority
                    .as_deref()
                    .is_some_and(|a| matches_term(a, &needle))
                || d.tags.iter().any(|t| matches_term(t, &needle))
        })
        .collect()
}

/// Case-insensitive search over profile status, goals, and notes.
#[must_use]
pub fn search_profiles<'a>(profiles: &'a [Profile], term: &str) -> Vec<&'a Profile> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return profiles.iter().collect();
    }
    profiles
        .iter()
        .filter(|p| {
            matches_term(&p.current_status.status_name, &needle)
                || matches_term(&p.current_status.status_code, &needle)
                || p.immigration_goals
                    .as_deref()
                    .is_some_and(|g| matches_term(g, &needle))
                || p.notes.as_deref().is_some_and(|n| matches_term(n, &needle))
        })
        .collect()
}

/// Unread badge count from the inbox slice.
#[must_use]
pub fn unread_count(state: &NotificationsState) -> u64 {
    state.unread_count
}

/// Count of critical-priority notifications currently in the page.
#[must_use]
pub fn critical_count(state: &NotificationsState) -> usize {
    state
        .notifications
        .iter()
        .filter(|n| n.priority.eq_ignore_ascii_case("critical"))
        .count()
}

/// Open deadlines due within `days_ahead` days of `today`, soonest
/// first.
#[must_use]
pub fn upcoming_deadlines<'a>(
    deadlines: &'a [Deadline],
    today: NaiveDate,
    days_ahead: i64,
) -> Vec<&'a Deadline> {
    let mut upcoming: Vec<&Deadline> = deadlines
        .iter()
        .filter(|d| {
            let due = d.deadline_date.date_naive();
            !d.is_completed && due >= today && days_until(due, today) <= days_ahead
        })
        .collect();
    upcoming.sort_by_key(|d| d.deadline_date);
    upcoming
}
