//! Documents slice: the document vault list and the opened document.
//!
//! Extraction results are returned to the caller rather than merged
//! into the list; a caller that wants the refreshed metadata re-fetches
//! the document explicitly.

use std::sync::Arc;

use bytes::Bytes;
use casekit_api::documents::{
    Document, DocumentFilter, DocumentUpdate, DocumentUpload, DocumentsApi, ExtractionResult,
};
use casekit_http::HttpError;
use parking_lot::RwLock;

use crate::lifecycle::{FetchGate, RequestLifecycle};

#[derive(Debug, Clone, Default)]
pub struct DocumentsState {
    pub documents: Vec<Document>,
    pub selected: Option<Document>,
    /// Filter used for the most recent fetch, kept so the UI can render
    /// active filter chips.
    pub filter: DocumentFilter,
    pub lifecycle: RequestLifecycle,
}

pub struct DocumentsSlice {
    api: Arc<dyn DocumentsApi>,
    state: RwLock<DocumentsState>,
    gate: FetchGate,
}

impl DocumentsSlice {
    #[must_use]
    pub fn new(api: Arc<dyn DocumentsApi>) -> Self {
        Self {
            api,
            state: RwLock::new(DocumentsState::default()),
            gate: FetchGate::new(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> DocumentsState {
        self.state.read().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().lifecycle.clear_error();
    }

    /// Replace the list with the filtered server result. When filters
    /// change rapidly, only the latest response is applied.
    pub async fn fetch(&self, filter: DocumentFilter) -> Result<(), HttpError> {
        let ticket = self.gate.issue();
        self.state.write().lifecycle.start();

        match self.api.list(&filter).await {
            Ok(documents) => {
                let mut state = self.state.write();
                if self.gate.is_current(ticket) {
                    state.lifecycle.finish();
                    state.documents = documents;
                    state.filter = filter;
                } else {
                    tracing::debug!("discarding superseded document list response");
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

    /// Fetch one document's metadata and open it.
    pub async fn select(&self, document_id: &str) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.get(document_id).await {
            Ok(document) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.selected = Some(document);
                Ok(())
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Upload a file; the confirmed record is appended to the list.
    pub async fn upload(
        &self,
        meta: DocumentUpload,
        file_name: &str,
        mime: &mime::Mime,
        bytes: Bytes,
    ) -> Result<Document, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.upload(meta, file_name, mime, bytes).await {
            Ok(document) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.documents.push(document.clone());
                Ok(document)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }

    /// Correct metadata in place; the opened document follows when it
    /// matches.
    pub async fn update(&self, document_id: &str, body: &DocumentUpdate) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.update(document_id, body).await {
            Ok(updated) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                if let Some(slot) = state
                    .documents
                    .iter_mut()
                    .find(|d| d.document_id == updated.document_id)
                {
                    *slot = updated.clone();
                }
                if state
                    .selected
                    .as_ref()
                    .is_some_and(|s| s.document_id == updated.document_id)
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

    /// Delete a document after server confirmation.
    pub async fn delete(&self, document_id: &str) -> Result<(), HttpError> {
        self.state.write().lifecycle.start();
        match self.api.delete(document_id).await {
            Ok(()) => {
                let mut state = self.state.write();
                state.lifecycle.finish();
                state.documents.retain(|d| d.document_id != document_id);
                if state
                    .selected
                    .as_ref()
                    .is_some_and(|s| s.document_id == document_id)
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

    /// Download the stored file for link synthesis. A pass-through that
    /// does not touch slice state.
    pub async fn download(&self, document_id: &str) -> Result<Bytes, HttpError> {
        self.api.download(document_id).await
    }

    /// Run OCR extraction; the result is handed back, not merged.
    pub async fn extract(&self, document_id: &str) -> Result<ExtractionResult, HttpError> {
        self.state.write().lifecycle.start();
        match self.api.extract_data(document_id).await {
            Ok(result) => {
                self.state.write().lifecycle.finish();
                Ok(result)
            }
            Err(error) => {
                self.state.write().lifecycle.fail(&error);
                Err(error)
            }
        }
    }
}
