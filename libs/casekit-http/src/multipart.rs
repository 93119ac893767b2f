//! Multipart upload payloads.
//!
//! File uploads combine one binary part with scalar metadata fields. The
//! builder records parts in a rebuildable form (the adapter may need to
//! send the request twice after a token refresh) and omits absent optional
//! fields instead of sending empty strings, so server-side defaults are
//! never overwritten.

use bytes::Bytes;

use crate::error::HttpError;

#[derive(Debug, Clone)]
enum PartBody {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Bytes,
    },
}

/// A rebuildable multipart form payload.
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    parts: Vec<(String, PartBody)>,
}

impl MultipartPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scalar text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push((name.to_owned(), PartBody::Text(value.into())));
        self
    }

    /// Add a scalar text field only when a value is present.
    #[must_use]
    pub fn maybe_text(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Add a binary file part.
    #[must_use]
    pub fn file(
        mut self,
        name: &str,
        file_name: impl Into<String>,
        mime: &mime::Mime,
        bytes: Bytes,
    ) -> Self {
        self.parts.push((
            name.to_owned(),
            PartBody::File {
                file_name: file_name.into(),
                mime: mime.to_string(),
                bytes,
            },
        ));
        self
    }

    /// Names of the recorded parts, in insertion order.
    #[must_use]
    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Materialize a `reqwest` form. Callable repeatedly; each call builds
    /// a fresh form from the recorded parts.
    pub(crate) fn to_form(&self) -> Result<reqwest::multipart::Form, HttpError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, body) in &self.parts {
            match body {
                PartBody::Text(value) => {
                    form = form.text(name.clone(), value.clone());
                }
                PartBody::File {
                    file_name,
                    mime,
                    bytes,
                } => {
                    let part = reqwest::multipart::Part::stream(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime)
                        .map_err(|e| HttpError::Multipart(e.to_string()))?;
                    form = form.part(name.clone(), part);
                }
            }
        }
        Ok(form)
    }
}
