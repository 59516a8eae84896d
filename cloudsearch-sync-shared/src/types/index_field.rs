//! Index field definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type of a remote index field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IndexFieldType {
    Uint,
    Text,
    Literal,
}

impl IndexFieldType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uint => "uint",
            Self::Text => "text",
            Self::Literal => "literal",
        }
    }

    /// Name of the options structure the remote API expects for this type.
    pub fn options_name(&self) -> &'static str {
        match self {
            Self::Uint => "UIntOptions",
            Self::Text => "TextOptions",
            Self::Literal => "LiteralOptions",
        }
    }
}

impl fmt::Display for IndexFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexFieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uint" => Ok(Self::Uint),
            "text" => Ok(Self::Text),
            "literal" => Ok(Self::Literal),
            other => Err(format!("unsupported index field type: {}", other)),
        }
    }
}

/// A field definition to push to the remote domain.
///
/// Options that do not apply to the field's type are ignored when the definition
/// is sent. Unset text and literal flags are sent as `false`; an unset default
/// value is not sent at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexField {
    pub name: String,
    pub field_type: IndexFieldType,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub facet_enabled: Option<bool>,
    #[serde(default)]
    pub result_enabled: Option<bool>,
    #[serde(default)]
    pub search_enabled: Option<bool>,
}

impl IndexField {
    /// Create a definition with default options.
    pub fn new(name: impl Into<String>, field_type: IndexFieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default_value: None,
            facet_enabled: None,
            result_enabled: None,
            search_enabled: None,
        }
    }

    pub fn uint(name: impl Into<String>) -> Self {
        Self::new(name, IndexFieldType::Uint)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, IndexFieldType::Text)
    }

    pub fn literal(name: impl Into<String>) -> Self {
        Self::new(name, IndexFieldType::Literal)
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn facet(mut self, enabled: bool) -> Self {
        self.facet_enabled = Some(enabled);
        self
    }

    pub fn result(mut self, enabled: bool) -> Self {
        self.result_enabled = Some(enabled);
        self
    }

    pub fn search(mut self, enabled: bool) -> Self {
        self.search_enabled = Some(enabled);
        self
    }

    /// Type-specific options as `(option name, value)` pairs, in wire order.
    pub fn options(&self) -> Vec<(&'static str, String)> {
        let flag = |value: Option<bool>| value.unwrap_or(false).to_string();

        let mut options = Vec::new();
        if let Some(ref default_value) = self.default_value {
            options.push(("DefaultValue", default_value.clone()));
        }
        match self.field_type {
            IndexFieldType::Uint => {}
            IndexFieldType::Text => {
                options.push(("FacetEnabled", flag(self.facet_enabled)));
                options.push(("ResultEnabled", flag(self.result_enabled)));
            }
            IndexFieldType::Literal => {
                options.push(("FacetEnabled", flag(self.facet_enabled)));
                options.push(("ResultEnabled", flag(self.result_enabled)));
                options.push(("SearchEnabled", flag(self.search_enabled)));
            }
        }
        options
    }
}

/// The schema applied to new domains before any contributor adds to it.
pub fn default_schema() -> Vec<IndexField> {
    vec![
        IndexField::uint("blog_id"),
        IndexField::uint("site_id"),
        IndexField::uint("post_author"),
        IndexField::text("post_author_name"),
        IndexField::text("post_title").result(true),
        IndexField::text("post_content"),
        IndexField::text("post_excerpt"),
        IndexField::uint("post_date_gmt"),
        IndexField::literal("post_status").facet(true).search(true),
        IndexField::literal("post_type").facet(true).search(true),
        IndexField::uint("comment_count"),
        IndexField::uint("post_category"),
        IndexField::literal("tag_input").facet(true).search(true),
        IndexField::text("taxonomy_post_tag_label"),
        IndexField::text("taxonomy_category_label"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_options_omit_unset_default() {
        assert!(IndexField::uint("comment_count").options().is_empty());
        assert_eq!(
            IndexField::uint("comment_count").with_default("0").options(),
            vec![("DefaultValue", "0".to_string())]
        );
    }

    #[test]
    fn test_literal_options_default_to_false() {
        let options = IndexField::literal("post_type").facet(true).options();
        assert_eq!(
            options,
            vec![
                ("FacetEnabled", "true".to_string()),
                ("ResultEnabled", "false".to_string()),
                ("SearchEnabled", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_text_options_ignore_search_flag() {
        let options = IndexField::text("post_title").search(true).options();
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|(name, _)| *name != "SearchEnabled"));
    }

    #[test]
    fn test_default_schema_has_unique_names() {
        let schema = default_schema();
        let mut names: Vec<_> = schema.iter().map(|f| f.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), schema.len());
    }

    #[test]
    fn test_field_type_parsing() {
        assert_eq!("uint".parse::<IndexFieldType>(), Ok(IndexFieldType::Uint));
        assert!("int".parse::<IndexFieldType>().is_err());
        assert_eq!(IndexFieldType::Literal.options_name(), "LiteralOptions");
    }
}
