//! Search query types.
//!
//! This module defines the structured boolean expression tree and the
//! parameter set sent to the remote search endpoint.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Value matched by a field expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchValue {
    /// Rendered quoted: `field:'value'`.
    Text(String),
    /// Rendered bare: `field:value`.
    Numeric(String),
}

/// A node in the structured (boolean) query language.
///
/// Rendering drops degenerate nodes: an `And`/`Or` whose children all render to
/// nothing disappears instead of producing empty parentheses, as do empty labels,
/// empty matches and open-ended ranges with neither bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BooleanExpr {
    And(Vec<BooleanExpr>),
    Or(Vec<BooleanExpr>),
    Match { field: String, value: MatchValue },
    Range {
        field: String,
        start: Option<String>,
        end: Option<String>,
    },
    Label(String),
}

impl BooleanExpr {
    /// Quoted string match.
    pub fn text(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            value: MatchValue::Text(value.into()),
        }
    }

    /// Bare numeric match.
    pub fn numeric(field: impl Into<String>, value: impl ToString) -> Self {
        Self::Match {
            field: field.into(),
            value: MatchValue::Numeric(value.to_string()),
        }
    }

    /// `Or` over one text match per value.
    pub fn any_text<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Or(values.into_iter().map(|v| Self::text(field, v)).collect())
    }

    /// Render the expression, or `None` if nothing is left after pruning.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::And(children) => render_group("and", children),
            Self::Or(children) => render_group("or", children),
            Self::Match { field, value } => match value {
                MatchValue::Text(text) if text.is_empty() => None,
                MatchValue::Text(text) => Some(format!("{}:'{}'", field, escape_quoted(text))),
                MatchValue::Numeric(n) if n.trim().is_empty() => None,
                MatchValue::Numeric(n) => Some(format!("{}:{}", field, n.trim())),
            },
            Self::Range { field, start, end } => {
                let start = start.as_deref().unwrap_or("");
                let end = end.as_deref().unwrap_or("");
                if start.is_empty() && end.is_empty() {
                    None
                } else {
                    Some(format!("{}:{}..{}", field, start, end))
                }
            }
            Self::Label(term) if term.trim().is_empty() => None,
            Self::Label(term) => Some(format!("(label '{}')", escape_quoted(term))),
        }
    }
}

fn render_group(operator: &str, children: &[BooleanExpr]) -> Option<String> {
    let rendered: Vec<String> = children.iter().filter_map(BooleanExpr::render).collect();
    if rendered.is_empty() {
        return None;
    }
    Some(format!("({} {})", operator, rendered.join(" ")))
}

/// Backslash-escape quotes and backslashes for a quoted literal.
fn escape_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\'' | '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Sort direction for a rank field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse a direction leniently: anything other than `desc` (any case) is ascending.
    pub fn parse_lenient(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Parameter set for one search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudSearchQuery {
    pub boolean_query: Option<String>,
    pub facets: Vec<String>,
    pub facet_constraints: BTreeMap<String, Vec<String>>,
    pub facet_top_n: BTreeMap<String, u32>,
    pub return_fields: Vec<String>,
    pub size: u32,
    pub start: u32,
    pub ranks: Vec<(String, SortDirection)>,
}

impl Default for CloudSearchQuery {
    fn default() -> Self {
        Self {
            boolean_query: None,
            facets: Vec::new(),
            facet_constraints: BTreeMap::new(),
            facet_top_n: BTreeMap::new(),
            return_fields: Vec::new(),
            size: 10,
            start: 0,
            ranks: Vec::new(),
        }
    }
}

impl CloudSearchQuery {
    /// Create a query with default paging (size 10, start 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the structured query from an expression tree; a fully pruned tree clears it.
    pub fn set_boolean_expr(&mut self, expr: &BooleanExpr) {
        self.boolean_query = expr.render();
    }

    /// Request a facet for a field. Empty names are ignored.
    pub fn add_facet(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !field.is_empty() && !self.facets.contains(&field) {
            self.facets.push(field);
        }
    }

    /// Restrict a facet to the given buckets.
    ///
    /// Old-style ranges (`1..2`) are rewritten to the `1,2` form.
    pub fn add_facet_constraint<I, S>(&mut self, field: impl Into<String>, constraints: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let constraints = constraints
            .into_iter()
            .map(|c| c.as_ref().replace("..", ","))
            .collect();
        self.facet_constraints.insert(field.into(), constraints);
    }

    pub fn add_facet_top_n(&mut self, field: impl Into<String>, limit: u32) {
        self.facet_top_n.insert(field.into(), limit);
    }

    pub fn add_return_field(&mut self, field: impl Into<String>) {
        self.return_fields.push(field.into());
    }

    /// Add a sort field. A field ranked twice keeps its first position and the last direction.
    pub fn add_rank(&mut self, field: impl Into<String>, direction: SortDirection) {
        let field = field.into();
        match self.ranks.iter_mut().find(|(name, _)| *name == field) {
            Some(rank) => rank.1 = direction,
            None => self.ranks.push((field, direction)),
        }
    }

    /// Request parameters in submission order.
    ///
    /// Empty and zero-valued scalar parameters are left out. `q.parser=structured`
    /// is added only when a boolean query is present.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = Vec::new();

        let mut push = |name: &str, value: String| {
            if !value.is_empty() && value != "0" {
                params.push((name.to_string(), value));
            }
        };

        push("q", self.boolean_query.clone().unwrap_or_default());
        push("return", self.return_fields.join(","));
        push("size", self.size.to_string());
        push("start", self.start.to_string());
        push(
            "sort",
            self.ranks
                .iter()
                .map(|(field, direction)| format!("{} {}", field, direction))
                .collect::<Vec<_>>()
                .join(","),
        );

        for field in &self.facets {
            let value = match self.facet_constraints.get(field) {
                Some(buckets) => serde_json::json!({ "buckets": buckets }).to_string(),
                None => "{}".to_string(),
            };
            params.push((format!("facet.{}", field), value));
        }
        for (field, buckets) in &self.facet_constraints {
            if !self.facets.contains(field) {
                params.push((
                    format!("facet.{}", field),
                    serde_json::json!({ "buckets": buckets }).to_string(),
                ));
            }
        }

        if self.boolean_query.is_some() {
            params.push(("q.parser".to_string(), "structured".to_string()));
        }

        for (field, limit) in &self.facet_top_n {
            params.push((format!("facet-{}-top-n", field), limit.to_string()));
        }

        params
    }
}
