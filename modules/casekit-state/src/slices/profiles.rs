//! Profiles slice: the beneficiary's profiles plus the selected one.

use std::sync::Arc;

use casekit_api::profiles::{Profile, ProfileCreate, ProfileUpdate, ProfilesApi};
use casekit_http::HttpError;
use parking_lot::RwLock;

use crate::lifecycle::{FetchGate, RequestLifecycle};

#[derive(Debug, Clone, Default)]
pub struct ProfilesState {
    pub profiles: Vec<Profile>,
    pub selected: Option<Profile>,
    pub lifecycle: RequestLifecycle,
}

pub struct ProfilesSlice {
    api: Arc<dyn ProfilesApi>,
    state: RwLock<ProfilesState>,
    gate: FetchGate,
}

impl ProfilesSlice {
    #[must_use]
    pub fn new(api: Arc<dyn ProfilesApi>) -> Self {
        Self {
            api,
            state: RwLock::new(ProfilesState::default()),
            gate: FetchGate::new(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ProfilesState {
        self.state.read().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().lifecycle.clear_error();
    }

    /// Replace the whole collection with the server's list. A response
    /// superseded by a newer fetch is discarded.
    pub async fn fetch_all(&self) -> Result<(), HttpError> {
        let ticket = self.gate.issue();
        self.state.write().lifecycle.start();

        match self.api.list().await {
            Ok(profiles) => {
                let mut state = self.state.write();
                if self.gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.profiles = profiles;
                } else {
                    tracing::debug!("discarding superseded profile list response");
                }
                Ok(())
            }
            Err(error) => {
                if self.gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    /// Fetch one profile and make it the selected one.
    pub async fn select(&self, profile_id: &str) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.get(profile_id).await {
            Ok(profile) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.selected = Some(profile);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Create a profile; appended to the collection and selected once
    /// the server confirms it.
    pub async fn create(&self, body: &ProfileCreate) -> Result<Profile, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.create(body).await {
            Ok(profile) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.profiles.push(profile.clone());
                state.selected = Some(profile.clone());
                Ok(profile)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Update a profile in place; the selected slot follows when it
    /// matches.
    pub async fn update(&self, profile_id: &str, body: &ProfileUpdate) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update(profile_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state
                    .profiles
                    .iter_mut()
                    .find(|p| p.profile_id == updated.profile_id)
                {
                    *slot = updated.clone();
                }
                if state
                    .selected
                    .as_ref()
                    .is_some_and(|s| s.profile_id == updated.profile_id)
                {
                    state.selected = Some(updated);
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Delete a profile; removal and deselection happen only after the
    /// server confirms. Deleting an id that is no longer present leaves
    /// the collection unchanged.
    pub async fn delete(&self, profile_id: &str) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete(profile_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.profiles.retain(|p| p.profile_id != profile_id);
                if state
                    .selected
                    .as_ref()
                    .is_some_and(|s| s.profile_id == profile_id)
                {
                    state.selected = None;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }
}
