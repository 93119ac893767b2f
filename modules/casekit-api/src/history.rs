//! Address and employment history endpoints, including the H1-B
//! compliance check and list exports.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use casekit_http::{HttpClient, Query};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ApiResult;

/// Pagination window shared by all history list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u32,
    pub limit: u32,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

impl PageWindow {
    fn to_query(self) -> Query {
        Query::new().set("skip", self.skip).set("limit", self.limit)
    }
}

/// Export formats accepted by the history export endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address_id: Uuid,
    pub street_address_1: String,
    pub street_address_2: Option<String>,
    pub city_id: Option<Uuid>,
    pub state_id: Option<Uuid>,
    pub zip_code: Option<String>,
    pub country_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address_type: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    pub verification_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    // Denormalized display names resolved server-side.
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressCreate {
    pub street_address_1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    pub country_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
}

/// A dated residence period linking a profile to an [`Address`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressHistory {
    pub address_history_id: Uuid,
    pub profile_id: Uuid,
    pub address_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub address_type: Option<String>,
    pub verification_document_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressHistoryCreate {
    pub address_id: Uuid,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_document_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressHistoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_document_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employer {
    pub employer_id: Uuid,
    pub company_name: String,
    pub company_ein: Option<String>,
    pub company_type: Option<String>,
    pub industry: Option<String>,
    pub address_id: Option<Uuid>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    pub verification_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployerCreate {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_ein: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_ein: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

/// A dated employment period linking a profile to an [`Employer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentHistory {
    pub employment_id: Uuid,
    pub profile_id: Uuid,
    pub employer_id: Uuid,
    pub job_title: String,
    pub job_description: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub salary: Option<f64>,
    pub salary_frequency: Option<String>,
    pub working_hours_per_week: Option<f64>,
    pub work_location_id: Option<Uuid>,
    pub supervisor_name: Option<String>,
    pub supervisor_title: Option<String>,
    pub supervisor_phone: Option<String>,
    pub supervisor_email: Option<String>,
    pub termination_reason: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    pub verification_document_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub employer: Option<Employer>,
    #[serde(default)]
    pub work_location: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmploymentHistoryCreate {
    pub employer_id: Uuid,
    pub job_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours_per_week: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_location_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmploymentHistoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours_per_week: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_location_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
}

/// Outcome of the H1-B compliance check over employment history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct H1bValidation {
    pub is_valid: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Address and employment history operations.
#[async_trait]
pub trait HistoryApi: Send + Sync {
    async fn list_addresses(&self, window: PageWindow) -> ApiResult<Vec<Address>>;
    async fn create_address(&self, body: &AddressCreate) -> ApiResult<Address>;
    async fn update_address(&self, address_id: Uuid, body: &AddressUpdate) -> ApiResult<Address>;
    async fn delete_address(&self, address_id: Uuid) -> ApiResult<()>;

    async fn list_address_history(&self, window: PageWindow) -> ApiResult<Vec<AddressHistory>>;
    async fn create_address_history(
        &self,
        body: &AddressHistoryCreate,
    ) -> ApiResult<AddressHistory>;
    async fn update_address_history(
        &self,
        history_id: Uuid,
        body: &AddressHistoryUpdate,
    ) -> ApiResult<AddressHistory>;
    async fn delete_address_history(&self, history_id: Uuid) -> ApiResult<()>;

    async fn list_employers(&self, window: PageWindow) -> ApiResult<Vec<Employer>>;
    async fn create_employer(&self, body: &EmployerCreate) -> ApiResult<Employer>;
    async fn update_employer(&self, employer_id: Uuid, body: &EmployerUpdate)
    -> ApiResult<Employer>;
    async fn delete_employer(&self, employer_id: Uuid) -> ApiResult<()>;

    async fn list_employment_history(
        &self,
        window: PageWindow,
    ) -> ApiResult<Vec<EmploymentHistory>>;
    async fn create_employment_history(
        &self,
        body: &EmploymentHistoryCreate,
    ) -> ApiResult<EmploymentHistory>;
    async fn update_employment_history(
        &self,
        history_id: Uuid,
        body: &EmploymentHistoryUpdate,
    ) -> ApiResult<EmploymentHistory>;
    async fn delete_employment_history(&self, history_id: Uuid) -> ApiResult<()>;

    /// Export one history collection as an opaque blob for client-side
    /// download-link synthesis.
    async fn export_employment_history(&self, format: ExportFormat) -> ApiResult<Bytes>;
    async fn export_address_history(&self, format: ExportFormat) -> ApiResult<Bytes>;

    /// Check the whole employment record for H1-B compliance.
    async fn validate_h1b(&self) -> ApiResult<H1bValidation>;

    /// Check a single employment entry for H1-B compliance.
    async fn validate_h1b_entry(&self, history_id: Uuid) -> ApiResult<H1bValidation>;
}

pub struct HttpHistoryApi {
    http: Arc<HttpClient>,
}

impl HttpHistoryApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HistoryApi for HttpHistoryApi {
    async fn list_addresses(&self, window: PageWindow) -> ApiResult<Vec<Address>> {
        self.http
            .get_json_with("/history/addresses", &window.to_query())
            .await
    }

    async fn create_address(&self, body: &AddressCreate) -> ApiResult<Address> {
        self.http.post_json("/history/addresses", body).await
    }

    async fn update_address(&self, address_id: Uuid, body: &AddressUpdate) -> ApiResult<Address> {
        self.http
            .put_json(&format!("/history/addresses/{address_id}"), body)
            .await
    }

    async fn delete_address(&self, address_id: Uuid) -> ApiResult<()> {
        self.http
            .delete(&format!("/history/addresses/{address_id}"))
            .await
    }

    async fn list_address_history(&self, window: PageWindow) -> ApiResult<Vec<AddressHistory>> {
        self.http
            .get_json_with("/history/address-history", &window.to_query())
            .await
    }

    async fn create_address_history(
        &self,
        body: &AddressHistoryCreate,
    ) -> ApiResult<AddressHistory> {
        self.http.post_json("/history/address-history", body).await
    }

    async fn update_address_history(
        &self,
        history_id: Uuid,
        body: &AddressHistoryUpdate,
    ) -> ApiResult<AddressHistory> {
        self.http
            .put_json(&format!("/history/address-history/{history_id}"), body)
            .await
    }

    async fn delete_address_history(&self, history_id: Uuid) -> ApiResult<()> {
        self.http
            .delete(&format!("/history/address-history/{history_id}"))
            .await
    }

    async fn list_employers(&self, window: PageWindow) -> ApiResult<Vec<Employer>> {
        self.http
            .get_json_with("/history/employers", &window.to_query())
            .await
    }

    async fn create_employer(&self, body: &EmployerCreate) -> ApiResult<Employer> {
        self.http.post_json("/history/employers", body).await
    }

    async fn update_employer(
        &self,
        employer_id: Uuid,
        body: &EmployerUpdate,
    ) -> ApiResult<Employer> {
        self.http
            .put_json(&format!("/history/employers/{employer_id}"), body)
            .await
    }

    async fn delete_employer(&self, employer_id: Uuid) -> ApiResult<()> {
        self.http
            .delete(&format!("/history/employers/{employer_id}"))
            .await
    }

    async fn list_employment_history(
        &self,
        window: PageWindow,
    ) -> ApiResult<Vec<EmploymentHistory>> {
        self.http
            .get_json_with("/history/employment-history", &window.to_query())
            .await
    }

    async fn create_employment_history(
        &self,
        body: &EmploymentHistoryCreate,
    ) -> ApiResult<EmploymentHistory> {
        self.http
            .post_json("/history/employment-history", body)
            .await
    }

    async fn update_employment_history(
        &self,
        history_id: Uuid,
        body: &EmploymentHistoryUpdate,
    ) -> ApiResult<EmploymentHistory> {
        self.http
            .put_json(&format!("/history/employment-history/{history_id}"), body)
            .await
    }

    async fn delete_employment_history(&self, history_id: Uuid) -> ApiResult<()> {
        self.http
            .delete(&format!("/history/employment-history/{history_id}"))
            .await
    }

    async fn export_employment_history(&self, format: ExportFormat) -> ApiResult<Bytes> {
        let query = Query::new().set("format", format.as_str());
        self.http
            .get_bytes("/history/employment-history/export", &query)
            .await
    }

    async fn export_address_history(&self, format: ExportFormat) -> ApiResult<Bytes> {
        let query = Query::new().set("format", format.as_str());
        self.http
            .get_bytes("/history/address-history/export", &query)
            .await
    }

    async fn validate_h1b(&self) -> ApiResult<H1bValidation> {
        self.http.get_json("/history/validate-h1b").await
    }

    async fn validate_h1b_entry(&self, history_id: Uuid) -> ApiResult<H1bValidation> {
        self.http
            .get_json(&format!(
                "/history/employment-history/{history_id}/validate-h1b"
            ))
            .await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use casekit_http::HttpClientConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn api_for(server: &MockServer) -> HttpHistoryApi {
        let http = HttpClient::new(HttpClientConfig::new(server.base_url())).unwrap();
        HttpHistoryApi::new(Arc::new(http))
    }

    #[tokio::test]
    async fn employment_history_decodes_nested_employer() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET)
                .path("/history/employment-history")
                .query_param("skip", "0")
                .query_param("limit", "100");
            then.status(200).json_body(json!([{
                "employment_id": "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b0001",
                "profile_id": "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b0002",
                "employer_id": "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b0003",
                "job_title": "Software Engineer",
                "job_description": null,
                "department": null,
                "employment_type": "Full-time",
                "start_date": "2022-03-01",
                "end_date": null,
                "is_current": true,
                "salary": 145000.0,
                "salary_frequency": "Annual",
                "working_hours_per_week": 40.0,
                "work_location_id": null,
                "supervisor_name": null,
                "supervisor_title": null,
                "supervisor_phone": null,
                "supervisor_email": null,
                "termination_reason": null,
                "is_verified": false,
                "verification_document_id": null,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": null,
                "employer": {
                    "employer_id": "6f3a2e34-9f1e-4a8a-9af1-0d2f0c5b0003",
                    "company_name": "Acme Corp",
                    "company_ein": null,
                    "company_type": "Corporation",
                    "industry": null,
                    "address_id": null,
                    "contact_name": null,
                    "contact_email": null,
                    "contact_phone": null,
                    "is_verified": false,
                    "verification_date": null,
                    "created_at": "2024-01-01T00:00:00Z",
                    "updated_at": null
                },
                "work_location": null
            }]));
        });

        let entries = api_for(&server)
            .list_employment_history(PageWindow::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_current);
        let employer = entries[0].employer.as_ref().unwrap();
        assert_eq!(employer.company_name, "Acme Corp");
    }

    #[tokio::test]
    async fn h1b_validation_decodes_issue_lists() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/history/validate-h1b");
            then.status(200).json_body(json!({
                "is_valid": false,
                "issues": ["Gap in employment exceeding 60 days"],
                "warnings": ["Salary below prevailing wage for one entry"]
            }));
        });

        let result = api_for(&server).validate_h1b().await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn export_requests_format_parameter() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/history/address-history/export")
                .query_param("format", "pdf");
            then.status(200)
                .header("content-type", "application/pdf")
                .body("%PDF-1.4");
        });

        let blob = api_for(&server)
            .export_address_history(ExportFormat::Pdf)
            .await
            .unwrap();
        assert!(blob.starts_with(b"%PDF"));
        assert_eq!(mock.calls(), 1);
    }
}
