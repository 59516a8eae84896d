//! Query builder.
//!
//! Turns a structured [`SearchRequest`] into a [`CloudSearchQuery`] and runs it
//! against the search service.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use cloudsearch_sync_repository::DocumentService;
use cloudsearch_sync_shared::{BooleanExpr, CloudSearchQuery, SearchResponse, SortDirection};

use crate::errors::SyncError;

/// Facets requested when a search names none.
pub const DEFAULT_FACETS: [&str; 4] = ["post_type", "post_status", "post_category", "tag_input"];

/// Result field carrying the content id.
const RETURN_FIELD: &str = "id";

/// Field holding the publication date.
const DATE_FIELD: &str = "post_date_gmt";

/// Named result orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    Date,
    #[default]
    Relevancy,
    Lift,
}

impl OrderBy {
    /// Rank field the ordering sorts on.
    pub fn rank_field(&self) -> &'static str {
        match self {
            Self::Date => "post_date_gmt",
            Self::Relevancy => "text_relevance",
            Self::Lift => "weighted_text_relevance",
        }
    }

    /// Parse an ordering name; unknown names fall back to relevancy.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "date" => Self::Date,
            "lift" => Self::Lift,
            _ => Self::Relevancy,
        }
    }
}

/// Restricts private statuses to a single author's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateAccess {
    pub author_id: u64,
    pub statuses: Vec<String>,
}

/// A structured search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text term.
    pub term: String,
    /// Content types to match; empty matches every type.
    pub document_types: Vec<String>,
    /// Statuses visible to everyone.
    pub statuses: Vec<String>,
    /// Private statuses visible to the signed-in author.
    pub private_access: Option<PrivateAccess>,
    /// Taxonomy field to term ids, e.g. `post_category`.
    pub taxonomies: BTreeMap<String, Vec<u64>>,
    /// Literal facet field to accepted values.
    pub facet_selections: BTreeMap<String, Vec<String>>,
    /// Inclusive publication date bounds, as unix seconds.
    pub date_start: Option<i64>,
    pub date_end: Option<i64>,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    pub order_by: OrderBy,
    pub order: SortDirection,
    pub facets: Vec<String>,
    /// Bucket constraints per facet field, e.g. `["100..200"]`.
    pub facet_buckets: BTreeMap<String, Vec<String>>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            term: String::new(),
            document_types: Vec::new(),
            statuses: vec!["publish".to_string()],
            private_access: None,
            taxonomies: BTreeMap::new(),
            facet_selections: BTreeMap::new(),
            date_start: None,
            date_end: None,
            page: 1,
            per_page: 10,
            order_by: OrderBy::default(),
            order: SortDirection::default(),
            facets: DEFAULT_FACETS.iter().map(|f| f.to_string()).collect(),
            facet_buckets: BTreeMap::new(),
        }
    }
}

impl SearchRequest {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    /// The boolean expression tree of the request.
    ///
    /// Empty parts are pruned when the tree is rendered.
    pub fn boolean_expr(&self) -> BooleanExpr {
        let mut parts = vec![BooleanExpr::Label(self.term.clone())];

        if !self.document_types.iter().any(|t| t == "any") {
            parts.push(BooleanExpr::any_text("post_type", &self.document_types));
        }

        parts.push(self.status_expr());

        for (field, ids) in &self.taxonomies {
            parts.push(BooleanExpr::Or(
                ids.iter().map(|id| BooleanExpr::numeric(field.clone(), id)).collect(),
            ));
        }

        for (field, values) in &self.facet_selections {
            parts.push(BooleanExpr::any_text(field, values));
        }

        if self.date_start.is_some() || self.date_end.is_some() {
            parts.push(BooleanExpr::Range {
                field: DATE_FIELD.to_string(),
                start: self.date_start.map(|d| d.to_string()),
                end: self.date_end.map(|d| d.to_string()),
            });
        }

        BooleanExpr::And(parts)
    }

    fn status_expr(&self) -> BooleanExpr {
        let mut statuses: Vec<BooleanExpr> = self
            .statuses
            .iter()
            .map(|status| BooleanExpr::text("post_status", status.as_str()))
            .collect();

        if let Some(access) = &self.private_access {
            for status in &access.statuses {
                statuses.push(BooleanExpr::And(vec![
                    BooleanExpr::text("post_status", status.as_str()),
                    BooleanExpr::numeric("post_author", access.author_id),
                ]));
            }
        }

        BooleanExpr::Or(statuses)
    }

    /// Build the query parameters for this request.
    pub fn to_query(&self) -> CloudSearchQuery {
        let mut query = CloudSearchQuery::new();
        query.set_boolean_expr(&self.boolean_expr());

        for facet in &self.facets {
            query.add_facet(facet.as_str());
        }
        for (field, buckets) in &self.facet_buckets {
            query.add_facet_constraint(field.as_str(), buckets);
        }

        query.size = self.per_page;
        query.start = self.per_page.saturating_mul(self.page.saturating_sub(1));

        query.add_rank(self.order_by.rank_field(), self.order);
        query.add_return_field(RETURN_FIELD);
        query
    }
}

/// Runs structured searches against the search service.
pub struct SearchService {
    documents: Arc<dyn DocumentService>,
}

impl SearchService {
    pub fn new(documents: Arc<dyn DocumentService>) -> Self {
        Self { documents }
    }

    #[instrument(skip(self, request), fields(term = %request.term, page = request.page))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SyncError> {
        let query = request.to_query();
        let response = self.documents.search(&query).await?;
        debug!(found = response.found, hits = response.hits.len(), "Search completed");
        Ok(response)
    }
}
