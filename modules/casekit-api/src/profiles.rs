//! Immigration profile endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use casekit_http::HttpClient;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ApiResult;

/// Resolved immigration status attached to a profile response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmigrationStatus {
    pub status_code: String,
    pub status_name: String,
    pub status_category: String,
}

/// A beneficiary's immigration profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub profile_id: String,
    pub user_id: String,
    pub current_status: ImmigrationStatus,
    pub most_recent_i94_number: Option<String>,
    pub most_recent_entry_date: Option<NaiveDate>,
    pub immigration_goals: Option<String>,
    pub alien_registration_number: Option<String>,
    pub authorized_stay_until: Option<NaiveDate>,
    pub ead_expiry_date: Option<NaiveDate>,
    pub visa_expiry_date: Option<NaiveDate>,
    pub passport_number: Option<String>,
    pub passport_country_id: Option<String>,
    pub passport_expiry_date: Option<NaiveDate>,
    pub is_primary_beneficiary: bool,
    pub primary_beneficiary_id: Option<String>,
    pub profile_type: String,
    pub notes: Option<String>,
}

/// Body for `POST /profiles`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileCreate {
    pub current_status_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_recent_i94_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_recent_entry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immigration_goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alien_registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_stay_until: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ead_expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visa_expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_country_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_expiry_date: Option<NaiveDate>,
    pub is_primary_beneficiary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_beneficiary_id: Option<String>,
    pub profile_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body for `PUT /profiles/{id}`; every field optional, omitted fields
/// are left unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_recent_i94_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_recent_entry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immigration_goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alien_registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_stay_until: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ead_expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visa_expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_country_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary_beneficiary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_beneficiary_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Profile CRUD operations.
#[async_trait]
pub trait ProfilesApi: Send + Sync {
    /// List every profile visible to the current user (the primary
    /// beneficiary plus dependents).
    async fn list(&self) -> ApiResult<Vec<Profile>>;

    /// Fetch one profile by id.
    async fn get(&self, profile_id: &str) -> ApiResult<Profile>;

    /// Create a profile.
    async fn create(&self, body: &ProfileCreate) -> ApiResult<Profile>;

    /// Update a profile; omitted fields are left unchanged.
    async fn update(&self, profile_id: &str, body: &ProfileUpdate) -> ApiResult<Profile>;

    /// Delete a profile.
    async fn delete(&self, profile_id: &str) -> ApiResult<()>;
}

pub struct HttpProfilesApi {
    http: Arc<HttpClient>,
}

impl HttpProfilesApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProfilesApi for HttpProfilesApi {
    async fn list(&self) -> ApiResult<Vec<Profile>> {
        self.http.get_json("/profiles/").await
    }

    async fn get(&self, profile_id: &str) -> ApiResult<Profile> {
        self.http.get_json(&format!("/profiles/{profile_id}")).await
    }

    async fn create(&self, body: &ProfileCreate) -> ApiResult<Profile> {
        self.http.post_json("/profiles/", body).await
    }

    async fn update(&self, profile_id: &str, body: &ProfileUpdate) -> ApiResult<Profile> {
        self.http
            .put_json(&format!("/profiles/{profile_id}"), body)
            .await
    }

    async fn delete(&self, profile_id: &str) -> ApiResult<()> {
        self.http.delete(&format!("/profiles/{profile_id}")).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use casekit_http::HttpClientConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn api_for(server: &MockServer) -> HttpProfilesApi {
        let http = HttpClient::new(HttpClientConfig::new(server.base_url())).unwrap();
        HttpProfilesApi::new(Arc::new(http))
    }

    fn profile_body(id: &str) -> serde_json::Value {
        json!({
            "profile_id": id,
            "user_id": "u1",
            "current_status": {
                "status_code": "H1B",
                "status_name": "H-1B Specialty Occupation",
                "status_category": "work"
            },
            "most_recent_i94_number": "94000001",
            "most_recent_entry_date": "2023-06-01",
            "immigration_goals": null,
            "alien_registration_number": null,
            "authorized_stay_until": "2026-09-30",
            "ead_expiry_date": null,
            "visa_expiry_date": "2026-09-30",
            "passport_number": "P1234567",
            "passport_country_id": null,
            "passport_expiry_date": "2030-05-20",
            "is_primary_beneficiary": true,
            "primary_beneficiary_id": null,
            "profile_type": "primary",
            "notes": null
        })
    }

    #[tokio::test]
    async fn list_decodes_nested_status() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/profiles/");
            then.status(200).json_body(json!([profile_body("p1")]));
        });

        let profiles = api_for(&server).list().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].current_status.status_code, "H1B");
        assert_eq!(
            profiles[0].visa_expiry_date,
            Some(NaiveDate::from_ymd_opt(2026, 9, 30).unwrap())
        );
    }

    #[tokio::test]
    async fn update_serializes_only_set_fields() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/profiles/p1")
                .json_body(json!({"notes": "updated"}));
            then.status(200).json_body(profile_body("p1"));
        });

        let body = ProfileUpdate {
            notes: Some("updated".to_owned()),
            ..ProfileUpdate::default()
        };
        api_for(&server).update("p1", &body).await.unwrap();
        assert_eq!(mock.calls(), 1);
    }
}
