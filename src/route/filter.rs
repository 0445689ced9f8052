//! Per-parameter validation filters.
//!
//! A filter constrains what a single path parameter may capture. Filters are
//! resolved in priority order: a compiled [`Regex`], a keyword from the built-in
//! table (`@number`, `@string`, ...), a literal pattern string, and finally the
//! default class [`DEFAULT_PARAM_PATTERN`] for unfiltered parameters.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::RouteError;

/// Character class used for parameters without a filter
pub const DEFAULT_PARAM_PATTERN: &str = "[a-zA-Z0-9_.-]+";

static KEYWORDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("number", "[0-9]+"),
        ("string", "[a-zA-Z0-9]+"),
        ("alpha", "[a-zA-Z]+"),
        ("slug", "[a-z0-9-]+"),
        (
            "uuid",
            "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        ),
        ("any", "[^/]+"),
    ])
});

/// Look up a keyword (without the leading `@`) in the built-in table.
pub fn keyword_pattern(keyword: &str) -> Option<&'static str> {
    KEYWORDS.get(keyword).copied()
}

/// Validation pattern attached to one path parameter.
#[derive(Debug, Clone)]
pub enum ParamFilter {
    /// Pre-compiled expression; anchors (`^`, `$`) are stripped when embedded
    Regex(Regex),
    /// Keyword reference, stored without the `@`
    Keyword(String),
    /// Literal regular-expression source
    Pattern(String),
}

impl ParamFilter {
    /// Regular-expression source to embed inside the parameter's capture group.
    pub fn source(&self) -> Result<String, RouteError> {
        match self {
            ParamFilter::Regex(re) => Ok(strip_anchors(re.as_str()).to_string()),
            ParamFilter::Keyword(keyword) => keyword_pattern(keyword)
                .map(str::to_string)
                .ok_or_else(|| RouteError::UnknownFilterKeyword(format!("@{keyword}"))),
            ParamFilter::Pattern(pattern) => Ok(strip_anchors(pattern).to_string()),
        }
    }
}

fn strip_anchors(source: &str) -> &str {
    let source = source.strip_prefix('^').unwrap_or(source);
    match source.strip_suffix('$') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => source,
    }
}

impl From<&str> for ParamFilter {
    fn from(value: &str) -> Self {
        match value.strip_prefix('@') {
            Some(keyword) => ParamFilter::Keyword(keyword.to_string()),
            None => ParamFilter::Pattern(value.to_string()),
        }
    }
}

impl From<String> for ParamFilter {
    fn from(value: String) -> Self {
        ParamFilter::from(value.as_str())
    }
}

impl From<Regex> for ParamFilter {
    fn from(value: Regex) -> Self {
        ParamFilter::Regex(value)
    }
}
