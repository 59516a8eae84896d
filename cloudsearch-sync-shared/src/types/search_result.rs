//! Search response types.
//!
//! Decodes the remote search response into hit ids and flattened facet counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Facet counts flattened to `{field: {value: count}}`.
pub type FacetCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
}

/// Decoded search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub found: u64,
    pub start: u64,
    pub hits: Vec<SearchHit>,
    pub facets: FacetCounts,
}

impl SearchResponse {
    /// Decode a raw response body.
    ///
    /// Hit ids are read from `data.id` (a scalar or the first element of a list)
    /// and fall back to the hit's own `id`. Facets are read from either the
    /// `constraints` or the `buckets` list of each facet.
    pub fn from_value(value: &Value) -> Self {
        let hits_value = &value["hits"];

        let hits = hits_value["hit"]
            .as_array()
            .map(|hits| hits.iter().filter_map(hit_id).collect())
            .unwrap_or_default();

        Self {
            found: hits_value["found"].as_u64().unwrap_or(0),
            start: hits_value["start"].as_u64().unwrap_or(0),
            hits,
            facets: decode_facets(&value["facets"]),
        }
    }

    /// Hit ids in ranking order.
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }
}

fn hit_id(hit: &Value) -> Option<SearchHit> {
    let id = match &hit["data"]["id"] {
        Value::Array(ids) => ids.first().and_then(scalar_to_string),
        Value::Null => scalar_to_string(&hit["id"]),
        other => scalar_to_string(other),
    }?;
    Some(SearchHit { id })
}

/// Flatten `{field: {constraints|buckets: [{value, count}]}}` into `{field: {value: count}}`.
pub fn decode_facets(facets: &Value) -> FacetCounts {
    let Some(facets) = facets.as_object() else {
        return FacetCounts::new();
    };

    facets
        .iter()
        .map(|(field, facet)| {
            let entries = facet["constraints"]
                .as_array()
                .or_else(|| facet["buckets"].as_array())
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|entry| {
                            let value = scalar_to_string(&entry["value"])?;
                            let count = entry["count"].as_u64().unwrap_or(0);
                            Some((value, count))
                        })
                        .collect()
                })
                .unwrap_or_default();
            (field.clone(), entries)
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
