//! Form payloads for the configuration API.
//!
//! Configuration actions are sent as a flat, sorted set of URL-encoded
//! `key=value` pairs. Nested structures are flattened into dot-separated keys
//! before encoding.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Everything except the RFC 3986 unreserved characters is percent-encoded.
const STRICT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A flat set of form parameters, kept sorted byte-wise by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    params: BTreeMap<String, String>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a JSON object into a payload.
    ///
    /// Nested objects contribute `parent.child` keys; list items contribute
    /// `parent.member.N` keys numbered from 1. `null` values are skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use cloudsearch_sync_repository::FormPayload;
    /// use serde_json::json;
    ///
    /// let payload = FormPayload::flatten(&json!({
    ///     "DomainName": "lift",
    ///     "IndexField": {"IndexFieldName": "post_title", "TextOptions": {"FacetEnabled": "false"}}
    /// }));
    /// assert_eq!(payload.get("IndexField.TextOptions.FacetEnabled"), Some("false"));
    /// ```
    pub fn flatten(value: &Value) -> Self {
        let mut payload = Self::new();
        payload.flatten_into("", value);
        payload
    }

    /// Set a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Builder form of [`FormPayload::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add `prefix.member.N` parameters for a list of values.
    pub fn insert_members<S: AsRef<str>>(&mut self, prefix: &str, values: &[S]) {
        for (i, value) in values.iter().enumerate() {
            self.insert(format!("{}.member.{}", prefix, i + 1), value.as_ref());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The canonical query string: strictly encoded `k=v` pairs joined by `&`.
    pub fn canonical_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", strict_encode(k), strict_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn flatten_into(&mut self, prefix: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, child) in map {
                    self.flatten_into(&join_key(prefix, key), child);
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let key = join_key(prefix, &format!("member.{}", i + 1));
                    self.flatten_into(&key, item);
                }
            }
            Value::String(s) => self.insert(prefix, s.clone()),
            Value::Bool(b) => self.insert(prefix, b.to_string()),
            Value::Number(n) => self.insert(prefix, n.to_string()),
        }
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Percent-encode everything except unreserved characters; `~` stays literal.
pub fn strict_encode(value: &str) -> String {
    utf8_percent_encode(value, STRICT_ENCODE_SET).to_string()
}
