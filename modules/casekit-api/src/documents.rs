//! Document vault endpoints: metadata CRUD, file upload, and OCR
//! extraction triggers.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use casekit_http::{HttpClient, MultipartPayload, Query};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ApiResult;

/// An uploaded immigration document and its extracted metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub user_id: String,
    pub document_type: String,
    pub document_subtype: Option<String>,
    pub document_number: Option<String>,
    pub issuing_authority: Option<String>,
    pub related_immigration_type: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    #[serde(default)]
    pub is_verified: bool,
    pub upload_date: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub extraction_data: Option<serde_json::Value>,
}

/// Metadata accompanying a file upload. Serialized as text parts of the
/// multipart form rather than a JSON body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpload {
    pub document_type: String,
    pub document_subtype: Option<String>,
    pub document_number: Option<String>,
    pub issuing_authority: Option<String>,
    pub related_immigration_type: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl DocumentUpload {
    /// Assemble the multipart form: the file part plus one text part per
    /// present metadata field.
    fn into_payload(self, file_name: &str, mime: &mime::Mime, bytes: Bytes) -> MultipartPayload {
        let tags = if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.join(","))
        };
        MultipartPayload::new()
            .file("file", file_name, mime, bytes)
            .text("document_type", self.document_type)
            .maybe_text("document_subtype", self.document_subtype)
            .maybe_text("document_number", self.document_number)
            .maybe_text("issuing_authority", self.issuing_authority)
            .maybe_text("related_immigration_type", self.related_immigration_type)
            .maybe_text("issue_date", self.issue_date.map(|d| d.to_string()))
            .maybe_text("expiry_date", self.expiry_date.map(|d| d.to_string()))
            .maybe_text("tags", tags)
    }
}

/// Body for `PATCH /documents/{id}`; metadata corrections only, the
/// stored file is immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuing_authority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_immigration_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

/// Server-side filter for the document list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub document_type: Option<String>,
    pub expiry_before: Option<NaiveDate>,
    pub expiry_after: Option<NaiveDate>,
}

impl DocumentFilter {
    fn to_query(&self) -> Query {
        Query::new()
            .maybe("document_type", self.document_type.as_deref())
            .maybe("expiry_before", self.expiry_before)
            .maybe("expiry_after", self.expiry_after)
    }
}

/// Result of an OCR extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub extracted_fields: serde_json::Value,
    pub confidence_score: f64,
}

/// Document vault operations.
#[async_trait]
pub trait DocumentsApi: Send + Sync {
    /// List documents, optionally filtered by type or expiry window.
    async fn list(&self, filter: &DocumentFilter) -> ApiResult<Vec<Document>>;

    /// Fetch one document's metadata.
    async fn get(&self, document_id: &str) -> ApiResult<Document>;

    /// Upload a file with its metadata.
    async fn upload(
        &self,
        meta: DocumentUpload,
        file_name: &str,
        mime: &mime::Mime,
        bytes: Bytes,
    ) -> ApiResult<Document>;

    /// Correct a document's metadata.
    async fn update(&self, document_id: &str, body: &DocumentUpdate) -> ApiResult<Document>;

    /// Download the stored file body.
    async fn download(&self, document_id: &str) -> ApiResult<Bytes>;

    /// Delete a document and its stored file.
    async fn delete(&self, document_id: &str) -> ApiResult<()>;

    /// Trigger field extraction for an already-uploaded document.
    async fn extract_data(&self, document_id: &str) -> ApiResult<ExtractionResult>;
}

pub struct HttpDocumentsApi {
    http: Arc<HttpClient>,
}

impl HttpDocumentsApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DocumentsApi for HttpDocumentsApi {
    async fn list(&self, filter: &DocumentFilter) -> ApiResult<Vec<Document>> {
        self.http
            .get_json_with("/documents/", &filter.to_query())
            .await
    }

    async fn get(&self, document_id: &str) -> ApiResult<Document> {
        self.http
            .get_json(&format!("/documents/{document_id}"))
            .await
    }

    async fn upload(
        &self,
        meta: DocumentUpload,
        file_name: &str,
        mime: &mime::Mime,
        bytes: Bytes,
    ) -> ApiResult<Document> {
        let payload = meta.into_payload(file_name, mime, bytes);
        self.http.post_multipart("/documents/", &payload).await
    }

    async fn update(&self, document_id: &str, body: &DocumentUpdate) -> ApiResult<Document> {
        self.http
            .patch_json(&format!("/documents/{document_id}"), body)
            .await
    }

    async fn download(&self, document_id: &str) -> ApiResult<Bytes> {
        self.http
            .get_bytes(&format!("/documents/{document_id}/download"), &Query::new())
            .await
    }

    async fn delete(&self, document_id: &str) -> ApiResult<()> {
        self.http.delete(&format!("/documents/{document_id}")).await
    }

    async fn extract_data(&self, document_id: &str) -> ApiResult<ExtractionResult> {
        self.http
            .post_empty(&format!("/documents/{document_id}/extract-data"))
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

    fn api_for(server: &MockServer) -> HttpDocumentsApi {
        let http = HttpClient::new(HttpClientConfig::new(server.base_url())).unwrap();
        HttpDocumentsApi::new(Arc::new(http))
    }

    #[test]
    fn unset_filter_fields_produce_no_parameters() {
        let filter = DocumentFilter {
            document_type: Some("passport".to_owned()),
            ..DocumentFilter::default()
        };
        assert_eq!(filter.to_query().encode(), "document_type=passport");

        assert!(DocumentFilter::default().to_query().is_empty());
    }

    #[test]
    fn upload_payload_omits_absent_metadata() {
        let meta = DocumentUpload {
            document_type: "visa".to_owned(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            ..DocumentUpload::default()
        };
        let payload = meta.into_payload("visa.pdf", &mime::APPLICATION_PDF, Bytes::new());
        assert_eq!(payload.part_names(), ["file", "document_type", "issue_date"]);
    }

    #[tokio::test]
    async fn list_sends_filter_parameters() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/documents/")
                .query_param("document_type", "passport")
                .query_param("expiry_before", "2026-01-01");
            then.status(200).json_body(json!([]));
        });

        let filter = DocumentFilter {
            document_type: Some("passport".to_owned()),
            expiry_before: NaiveDate::from_ymd_opt(2026, 1, 1),
            expiry_after: None,
        };
        let documents = api_for(&server).list(&filter).await.unwrap();
        assert!(documents.is_empty());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn extract_data_posts_without_body() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(POST).path("/documents/d1/extract-data");
            then.status(200).json_body(json!({
                "extracted_fields": {"passport_number": "P1234567"},
                "confidence_score": 0.92
            }));
        });

        let result = api_for(&server).extract_data("d1").await.unwrap();
        assert_eq!(result.extracted_fields["passport_number"], "P1234567");
        assert!(result.confidence_score > 0.9);
    }
}
