//! Query-string construction.
//!
//! Filter state is a partial record: only defined, non-empty fields belong
//! in the request. The builder enforces that by construction instead of
//! per-call-site conditionals.

use std::fmt::Display;

/// An ordered set of query parameters.
///
/// `None` values and empty strings are never recorded, so serializing a
/// filter like `{document_type: "passport", expiry_before: None}` yields
/// `document_type=passport` only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. Empty string-coerced values are dropped.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Display) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.pairs.push((key.to_owned(), value));
        }
        self
    }

    /// Append a parameter only when the value is present (and non-empty).
    #[must_use]
    pub fn maybe(self, key: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The recorded key/value pairs, in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Percent-encoded `k=v&k=v` form.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_fields_are_excluded() {
        let query = Query::new()
            .maybe("document_type", Some("passport"))
            .maybe("expiry_before", None::<String>)
            .maybe("expiry_after", Some(""));

        assert_eq!(query.encode(), "document_type=passport");
    }

    #[test]
    fn defined_fields_keep_their_string_coerced_value() {
        let query = Query::new()
            .set("skip", 0)
            .set("limit", 100)
            .maybe("is_milestone", Some(true));

        assert_eq!(
            query.pairs(),
            &[
                ("skip".to_owned(), "0".to_owned()),
                ("limit".to_owned(), "100".to_owned()),
                ("is_milestone".to_owned(), "true".to_owned()),
            ]
        );
        assert_eq!(query.encode(), "skip=0&limit=100&is_milestone=true");
    }

    #[test]
    fn values_are_percent_encoded() {
        let query = Query::new().set("event_type", "status change");
        assert_eq!(query.encode(), "event_type=status+change");
    }

    #[test]
    fn empty_query_encodes_to_empty_string() {
        let query = Query::new().maybe("priority", None::<String>);
        assert!(query.is_empty());
        assert_eq!(query.encode(), "");
    }
}
