//! Path pattern compiler.
//!
//! Turns a path pattern such as `/users/:id/?:tab` into one anchored regular
//! expression plus the bookkeeping needed to decode a match:
//!
//! - static segments are escaped and matched verbatim
//! - `:name` becomes a required capture group `/(?P<p17>FILTER)`
//! - `?:name` becomes an optional group `(?:/(?P<p18>FILTER))?`
//!
//! Capture groups are labelled with process-unique surrogates (`p17`) instead of
//! the user-supplied names: labels must be plain identifiers, and a recompiled
//! route must never reuse the labels of its previous expression. The surrogate
//! table maps each label back to the parameter name.
//!
//! Patterns without parameters compile to no expression at all; they are matched
//! by string equality, which is the resolvers' fast path.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use super::filter::{ParamFilter, DEFAULT_PARAM_PATTERN};
use crate::error::RouteError;

static NEXT_SURROGATE: AtomicU64 = AtomicU64::new(0);

fn next_surrogate() -> String {
    let n = NEXT_SURROGATE.fetch_add(1, Ordering::Relaxed);
    format!("p{n}")
}

/// Strip trailing slashes; an empty path becomes `/`.
///
/// Request URLs must have their query string removed first, since `?` also
/// introduces optional parameters in patterns.
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Compiled form of a route path, re-derived whenever the path or a filter changes.
#[derive(Debug, Clone)]
pub struct CompiledPath {
    regex: Option<Regex>,
    /// Literal path, or the expression source with anonymous groups. Two routes
    /// with equal signatures match exactly the same URLs.
    signature: String,
    required: Vec<String>,
    optional: Vec<String>,
    /// surrogate label -> parameter name
    surrogates: HashMap<String, String>,
}

impl CompiledPath {
    fn literal(path: &str) -> Self {
        Self {
            regex: None,
            signature: path.to_string(),
            required: Vec::new(),
            optional: Vec::new(),
            surrogates: HashMap::new(),
        }
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// `true` when the path has no parameters and is compared by equality
    pub fn is_literal(&self) -> bool {
        self.regex.is_none()
    }

    pub fn required_params(&self) -> &[String] {
        &self.required
    }

    pub fn optional_params(&self) -> &[String] {
        &self.optional
    }

    pub fn surrogates(&self) -> &HashMap<String, String> {
        &self.surrogates
    }

    /// Parameter name for a capture label; labels of raw expressions map to themselves.
    pub fn param_name<'a>(&'a self, label: &'a str) -> &'a str {
        self.surrogates.get(label).map_or(label, String::as_str)
    }

    #[inline]
    pub fn is_match(&self, path: &str) -> bool {
        match &self.regex {
            None => self.signature == path,
            Some(re) => re.is_match(path),
        }
    }

    /// Match `path` and decode named captures into `name -> value`.
    ///
    /// Matching runs on the raw path. Values are percent-decoded afterwards; a
    /// value that does not decode to UTF-8 is kept raw.
    /// Optional parameters that did not participate in the match are absent.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let Some(re) = &self.regex else {
            return (self.signature == path).then(HashMap::new);
        };
        let caps = re.captures(path)?;
        let mut params = HashMap::with_capacity(self.surrogates.len());
        for label in re.capture_names().flatten() {
            if let Some(m) = caps.name(label) {
                let value = urlencoding::decode(m.as_str())
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| m.as_str().to_string());
                params.insert(self.param_name(label).to_string(), value);
            }
        }
        Some(params)
    }
}

fn push_group(buf: &mut String, optional: bool, label: Option<&str>, filter: &str) {
    if optional {
        buf.push_str("(?:/(");
    } else {
        buf.push_str("/(");
    }
    if let Some(label) = label {
        buf.push_str("?P<");
        buf.push_str(label);
        buf.push('>');
    }
    buf.push_str(filter);
    buf.push(')');
    if optional {
        buf.push_str(")?");
    }
}

/// Compile a path pattern with its parameter filters.
///
/// # Errors
///
/// - [`RouteError::InvalidPath`] for empty, unrooted, or `//`-containing paths
/// - [`RouteError::EmptyParam`] / [`RouteError::DuplicateParam`] for bad parameter segments
/// - [`RouteError::UnknownFilterKeyword`] / [`RouteError::InvalidPattern`] for bad filters
///
/// # Example
///
/// ```rust
/// use routeweave::route::compile;
/// use std::collections::BTreeMap;
///
/// let compiled = compile("/items/:id", &BTreeMap::new()).unwrap();
/// assert_eq!(compiled.required_params(), ["id"]);
/// assert_eq!(compiled.captures("/items/42").unwrap()["id"], "42");
/// ```
pub fn compile(
    pattern: &str,
    filters: &BTreeMap<String, ParamFilter>,
) -> Result<CompiledPath, RouteError> {
    if pattern.is_empty() || !pattern.starts_with('/') {
        return Err(RouteError::InvalidPath {
            path: pattern.to_string(),
            reason: "paths must be non-empty and start with `/`",
        });
    }
    let path = normalize_path(pattern);
    if path == "/" {
        return Ok(CompiledPath::literal(path));
    }

    // Reserve space for the final regex string and parameter lists
    let mut source = String::with_capacity(path.len() * 2 + 2);
    let mut signature = String::with_capacity(path.len() * 2 + 2);
    source.push('^');
    signature.push('^');
    let mut required = Vec::new();
    let mut optional = Vec::new();
    let mut surrogates = HashMap::new();

    for segment in path[1..].split('/') {
        if segment.is_empty() {
            return Err(RouteError::InvalidPath {
                path: pattern.to_string(),
                reason: "empty segment",
            });
        }
        let param = match segment.strip_prefix("?:") {
            Some(name) => Some((name, true)),
            None => segment.strip_prefix(':').map(|name| (name, false)),
        };
        let Some((name, is_optional)) = param else {
            let escaped = regex::escape(segment);
            source.push('/');
            source.push_str(&escaped);
            signature.push('/');
            signature.push_str(&escaped);
            continue;
        };

        if name.is_empty() {
            return Err(RouteError::EmptyParam(pattern.to_string()));
        }
        if required.iter().chain(optional.iter()).any(|p: &String| p == name) {
            return Err(RouteError::DuplicateParam {
                param: name.to_string(),
                path: pattern.to_string(),
            });
        }
        let filter = match filters.get(name) {
            Some(filter) => filter.source()?,
            None => DEFAULT_PARAM_PATTERN.to_string(),
        };
        let surrogate = next_surrogate();
        push_group(&mut source, is_optional, Some(&surrogate), &filter);
        push_group(&mut signature, is_optional, None, &filter);
        surrogates.insert(surrogate, name.to_string());
        if is_optional {
            optional.push(name.to_string());
        } else {
            required.push(name.to_string());
        }
    }

    if surrogates.is_empty() {
        return Ok(CompiledPath::literal(path));
    }

    source.push('$');
    signature.push('$');
    let regex = Regex::new(&source).map_err(|source| RouteError::InvalidPattern {
        path: pattern.to_string(),
        source,
    })?;

    Ok(CompiledPath {
        regex: Some(regex),
        signature,
        required,
        optional,
        surrogates,
    })
}

/// Wrap a user-supplied expression. Its named groups become required parameters
/// under their own names.
pub fn compile_regex(regex: &Regex) -> CompiledPath {
    let required = regex
        .capture_names()
        .flatten()
        .map(str::to_string)
        .collect();
    CompiledPath {
        regex: Some(regex.clone()),
        signature: regex.as_str().to_string(),
        required,
        optional: Vec::new(),
        surrogates: HashMap::new(),
    }
}
