//! One slice per backend domain.
//!
//! Every slice follows the same shape: a cloneable snapshot struct
//! guarded by a [`parking_lot::RwLock`], a [`crate::FetchGate`] per
//! fetched collection, and async actions that call the domain API and
//! apply the confirmed result. Mutations are never applied
//! optimistically.

pub mod chat;
pub mod documents;
pub mod history;
pub mod notifications;
pub mod profiles;
pub mod timeline;

pub use chat::ChatSlice;
pub use documents::DocumentsSlice;
pub use history::HistorySlice;
pub use notifications::NotificationsSlice;
pub use profiles::ProfilesSlice;
pub use timeline::TimelineSlice;
