//! History slice: addresses, residence periods, employers, employment
//! periods, and the cached H1-B compliance result.
//!
//! Mutating an employment entry does not invalidate the cached
//! validation; callers request [`HistorySlice::refresh_validation`]
//! explicitly when they want it recomputed.

use std::sync::Arc;

use casekit_api::history::{
    Address, AddressCreate, AddressHistory, AddressHistoryCreate, AddressHistoryUpdate,
    AddressUpdate, Employer, EmployerCreate, EmployerUpdate, EmploymentHistory,
    EmploymentHistoryCreate, EmploymentHistoryUpdate, H1bValidation, HistoryApi, PageWindow,
};
use casekit_http::HttpError;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::lifecycle::{FetchGate, RequestLifecycle};

#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    pub addresses: Vec<Address>,
    pub address_history: Vec<AddressHistory>,
    pub employers: Vec<Employer>,
    pub employment_history: Vec<EmploymentHistory>,
    /// Last explicitly requested compliance result.
    pub validation: Option<H1bValidation>,
    pub lifecycle: RequestLifecycle,
}

pub struct HistorySlice {
    api: Arc<dyn HistoryApi>,
    state: RwLock<HistoryState>,
    addresses_gate: FetchGate,
    address_history_gate: FetchGate,
    employers_gate: FetchGate,
    employment_gate: FetchGate,
}

impl HistorySlice {
    #[must_use]
    pub fn new(api: Arc<dyn HistoryApi>) -> Self {
        Self {
            api,
            state: RwLock::new(HistoryState::default()),
            addresses_gate: FetchGate::new(),
            address_history_gate: FetchGate::new(),
            employers_gate: FetchGate::new(),
            employment_gate: FetchGate::new(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> HistoryState {
        self.state.read().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().lifecycle.clear_error();
    }

    pub async fn fetch_addresses(&self, window: PageWindow) -> Result<(), HttpError> {
        let ticket = self.addresses_gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list_addresses(window).await {
            Ok(addresses) => {
                let mut state = self.state.write();
                if self.addresses_gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.addresses = addresses;
                } else {
                    tracing::debug!("discarding superseded address list response");
                }
                Ok(())
            }
            Err(error) => {
                if self.addresses_gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    pub async fn create_address(&self, body: &AddressCreate) -> Result<Address, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.create_address(body).await {
            Ok(address) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.addresses.push(address.clone());
                Ok(address)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn update_address(
        &self,
        address_id: Uuid,
        body: &AddressUpdate,
    ) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update_address(address_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state
                    .addresses
                    .iter_mut()
                    .find(|a| a.address_id == updated.address_id)
                {
                    *slot = updated;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn delete_address(&self, address_id: Uuid) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete_address(address_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.addresses.retain(|a| a.address_id != address_id);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn fetch_address_history(&self, window: PageWindow) -> Result<(), HttpError> {
        let ticket = self.address_history_gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list_address_history(window).await {
            Ok(entries) => {
                let mut state = self.state.write();
                if self.address_history_gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.address_history = entries;
                } else {
                    tracing::debug!("discarding superseded address history response");
                }
                Ok(())
            }
            Err(error) => {
                if self.address_history_gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    pub async fn create_address_history(
        &self,
        body: &AddressHistoryCreate,
    ) -> Result<AddressHistory, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.create_address_history(body).await {
            Ok(entry) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.address_history.push(entry.clone());
                Ok(entry)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn update_address_history(
        &self,
        history_id: Uuid,
        body: &AddressHistoryUpdate,
    ) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update_address_history(history_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state
                    .address_history
                    .iter_mut()
                    .find(|e| e.address_history_id == updated.address_history_id)
                {
                    *slot = updated;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn delete_address_history(&self, history_id: Uuid) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete_address_history(history_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state
                    .address_history
                    .retain(|e| e.address_history_id != history_id);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn fetch_employers(&self, window: PageWindow) -> Result<(), HttpError> {
        let ticket = self.employers_gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list_employers(window).await {
            Ok(employers) => {
                let mut state = self.state.write();
                if self.employers_gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.employers = employers;
                } else {
                    tracing::debug!("discarding superseded employer list response");
                }
                Ok(())
            }
            Err(error) => {
                if self.employers_gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    pub async fn create_employer(&self, body: &EmployerCreate) -> Result<Employer, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.create_employer(body).await {
            Ok(employer) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.employers.push(employer.clone());
                Ok(employer)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn update_employer(
        &self,
        employer_id: Uuid,
        body: &EmployerUpdate,
    ) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update_employer(employer_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state
                    .employers
                    .iter_mut()
                    .find(|e| e.employer_id == updated.employer_id)
                {
                    *slot = updated;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn delete_employer(&self, employer_id: Uuid) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete_employer(employer_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.employers.retain(|e| e.employer_id != employer_id);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn fetch_employment_history(&self, window: PageWindow) -> Result<(), HttpError> {
        let ticket = self.employment_gate.issue();
        self.state.write().lifecycle.start();
        match self.api.list_employment_history(window).await {
            Ok(entries) => {
                let mut state = self.state.write();
                if self.employment_gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.employment_history = entries;
                } else {
                    tracing::debug!("discarding superseded employment history response");
                }
                Ok(())
            }
            Err(error) => {
                if self.employment_gate.is_current(ticket) {
                    self.state.write().lifecycle.fail(&error);
                }
                Err(error)
            }
        }
    }

    pub async fn create_employment_history(
        &self,
        body: &EmploymentHistoryCreate,
    ) -> Result<EmploymentHistory, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.create_employment_history(body).await {
            Ok(entry) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.employment_history.push(entry.clone());
                Ok(entry)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn update_employment_history(
        &self,
        history_id: Uuid,
        body: &EmploymentHistoryUpdate,
    ) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update_employment_history(history_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state
                    .employment_history
                    .iter_mut()
                    .find(|e| e.employment_id == updated.employment_id)
                {
                    *slot = updated;
                }
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    pub async fn delete_employment_history(&self, history_id: Uuid) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete_employment_history(history_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state
                    .employment_history
                    .retain(|e| e.employment_id != history_id);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Recompute the H1-B compliance result and cache it.
    pub async fn refresh_validation(&self) -> Result<H1bValidation, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.validate_h1b().await {
            Ok(validation) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.validation = Some(validation.clone());
                Ok(validation)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use casekit_api::ApiResult;
    use casekit_api::history::ExportFormat;
    use chrono::Utc;
    use parking_lot::Mutex;

    fn entry(employment_id: Uuid, job_title: &str) -> EmploymentHistory {
        EmploymentHistory {
            employment_id,
            profile_id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            job_title: job_title.to_owned(),
            job_description: None,
            department: None,
            employment_type: None,
            start_date: chrono::NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
            end_date: None,
            is_current: true,
            salary: None,
            salary_frequency: None,
            working_hours_per_week: None,
            work_location_id: None,
            supervisor_name: None,
            supervisor_title: None,
            supervisor_phone: None,
            supervisor_email: None,
            termination_reason: None,
            is_verified: None,
            verification_document_id: None,
            created_at: Utc::now(),
            updated_at: None,
            employer: None,
            work_location: None,
        }
    }

    /// Double covering the employment endpoints: creates and updates
    /// confirm immediately, and the compliance check answers whatever is
    /// currently scripted.
    struct EmploymentDesk {
        validation: Mutex<H1bValidation>,
    }

    impl EmploymentDesk {
        fn new(validation: H1bValidation) -> Self {
            Self {
                validation: Mutex::new(validation),
            }
        }

        fn script_validation(&self, validation: H1bValidation) {
            *self.validation.lock() = validation;
        }
    }

    #[async_trait]
    impl HistoryApi for EmploymentDesk {
        async fn list_addresses(&self, _window: PageWindow) -> ApiResult<Vec<Address>> {
            unreachable!("not exercised")
        }
        async fn create_address(&self, _body: &AddressCreate) -> ApiResult<Address> {
            unreachable!("not exercised")
        }
        async fn update_address(
            &self,
            _address_id: Uuid,
            _body: &AddressUpdate,
        ) -> ApiResult<Address> {
            unreachable!("not exercised")
        }
        async fn delete_address(&self, _address_id: Uuid) -> ApiResult<()> {
            unreachable!("not exercised")
        }
        async fn list_address_history(
            &self,
            _window: PageWindow,
        ) -> ApiResult<Vec<AddressHistory>> {
            unreachable!("not exercised")
        }
        async fn create_address_history(
            &self,
            _body: &AddressHistoryCreate,
        ) -> ApiResult<AddressHistory> {
            unreachable!("not exercised")
        }
        async fn update_address_history(
            &self,
            _history_id: Uuid,
            _body: &AddressHistoryUpdate,
        ) -> ApiResult<AddressHistory> {
            unreachable!("not exercised")
        }
        async fn delete_address_history(&self, _history_id: Uuid) -> ApiResult<()> {
            unreachable!("not exercised")
        }
        async fn list_employers(&self, _window: PageWindow) -> ApiResult<Vec<Employer>> {
            unreachable!("not exercised")
        }
        async fn create_employer(&self, _body: &EmployerCreate) -> ApiResult<Employer> {
            unreachable!("not exercised")
        }
        async fn update_employer(
            &self,
            _employer_id: Uuid,
            _body: &EmployerUpdate,
        ) -> ApiResult<Employer> {
            unreachable!("not exercised")
        }
        async fn delete_employer(&self, _employer_id: Uuid) -> ApiResult<()> {
            unreachable!("not exercised")
        }

        async fn list_employment_history(
            &self,
            _window: PageWindow,
        ) -> ApiResult<Vec<EmploymentHistory>> {
            Ok(Vec::new())
        }

        async fn create_employment_history(
            &self,
            body: &EmploymentHistoryCreate,
        ) -> ApiResult<EmploymentHistory> {
            Ok(entry(Uuid::new_v4(), &body.job_title))
        }

        async fn update_employment_history(
            &self,
            history_id: Uuid,
            body: &EmploymentHistoryUpdate,
        ) -> ApiResult<EmploymentHistory> {
            let title = body.job_title.clone().unwrap_or_else(|| "unchanged".to_owned());
            Ok(entry(history_id, &title))
        }

        async fn delete_employment_history(&self, _history_id: Uuid) -> ApiResult<()> {
            unreachable!("not exercised")
        }

        async fn export_employment_history(&self, _format: ExportFormat) -> ApiResult<Bytes> {
            unreachable!("not exercised")
        }
        async fn export_address_history(&self, _format: ExportFormat) -> ApiResult<Bytes> {
            unreachable!("not exercised")
        }

        async fn validate_h1b(&self) -> ApiResult<H1bValidation> {
            Ok(self.validation.lock().clone())
        }

        async fn validate_h1b_entry(&self, _history_id: Uuid) -> ApiResult<H1bValidation> {
            unreachable!("not exercised")
        }
    }

    fn create_body(title: &str) -> EmploymentHistoryCreate {
        EmploymentHistoryCreate {
            employer_id: Uuid::new_v4(),
            job_title: title.to_owned(),
            start_date: chrono::NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
            is_current: true,
            ..EmploymentHistoryCreate::default()
        }
    }

    /// Employment creates append in confirmation order, and updates
    /// replace exactly the matching entry.
    #[tokio::test]
    async fn employment_entries_append_and_update_in_place() {
        let desk = Arc::new(EmploymentDesk::new(H1bValidation::default()));
        let slice = HistorySlice::new(desk);

        let first = slice.create_employment_history(&create_body("engineer")).await.unwrap();
        slice.create_employment_history(&create_body("senior engineer")).await.unwrap();

        let titles: Vec<String> = slice
            .snapshot()
            .employment_history
            .iter()
            .map(|e| e.job_title.clone())
            .collect();
        assert_eq!(titles, ["engineer", "senior engineer"]);

        let update = EmploymentHistoryUpdate {
            job_title: Some("staff engineer".to_owned()),
            ..EmploymentHistoryUpdate::default()
        };
        slice
            .update_employment_history(first.employment_id, &update)
            .await
            .unwrap();

        let state = slice.snapshot();
        assert_eq!(state.employment_history.len(), 2);
        assert_eq!(state.employment_history[0].job_title, "staff engineer");
        assert_eq!(state.employment_history[1].job_title, "senior engineer");
    }

    /// The compliance result is recomputed only on explicit request;
    /// employment mutations never touch the cached value.
    #[tokio::test]
    async fn validation_refreshes_only_on_request() {
        let stale = H1bValidation {
            is_valid: false,
            issues: vec!["employment gap exceeds 60 days".to_owned()],
            warnings: Vec::new(),
        };
        let desk = Arc::new(EmploymentDesk::new(stale.clone()));
        let slice = HistorySlice::new(desk.clone());

        slice.refresh_validation().await.unwrap();
        assert_eq!(slice.snapshot().validation, Some(stale.clone()));

        // The server-side picture changes, but only an explicit refresh
        // may pick it up.
        let fresh = H1bValidation {
            is_valid: true,
            issues: Vec::new(),
            warnings: Vec::new(),
        };
        desk.script_validation(fresh.clone());

        let created = slice.create_employment_history(&create_body("engineer")).await.unwrap();
        assert_eq!(slice.snapshot().validation, Some(stale.clone()));

        let update = EmploymentHistoryUpdate {
            job_title: Some("lead engineer".to_owned()),
            ..EmploymentHistoryUpdate::default()
        };
        slice
            .update_employment_history(created.employment_id, &update)
            .await
            .unwrap();
        assert_eq!(slice.snapshot().validation, Some(stale));

        slice.refresh_validation().await.unwrap();
        assert_eq!(slice.snapshot().validation, Some(fresh));
    }
}
