use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::ids::RequestId;
use crate::middleware::Identity;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Maximum inline path/query parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Header storage; names are shared `Arc<str>` since they repeat across requests
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Path or query parameter storage
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Request descriptor handed over by the transport layer.
///
/// Carries what resolution needs (method, URL, accepted languages) plus the
/// state the pipeline fills in as it runs: decoded path parameters, the merged
/// parameter bag and the authenticated identity.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Raw URL, query string included
    pub url: String,
    /// HTTP headers (case-insensitive lookup via [`Request::get_header`])
    pub headers: HeaderVec,
    /// Preferred languages, most preferred first
    pub accepted_languages: Vec<String>,
    /// Query string parameters in order of appearance
    pub query_params: ParamVec,
    /// Parameters captured from the matched route's path
    pub path_params: ParamVec,
    /// Merged bag: path parameters, then query parameters on top
    pub params: HashMap<String, String>,
    /// Request body (parsed by the out-of-scope transport layer)
    pub body: Option<Value>,
    /// Set by the authentication stage
    pub identity: Option<Identity>,
    cancel: CancellationToken,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let url = url.into();
        let query_params = parse_query_params(&url);
        Self {
            request_id: RequestId::new(),
            method,
            url,
            headers: HeaderVec::new(),
            accepted_languages: Vec::new(),
            query_params,
            path_params: ParamVec::new(),
            params: HashMap::new(),
            body: None,
            identity: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Add a header. `accept-language` also sets the preferred languages and
    /// `x-request-id` adopts the caller's request id when it is a valid ULID.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match name.as_str() {
            "accept-language" => self.accepted_languages = parse_accept_language(&value),
            "x-request-id" => self.request_id = RequestId::from_header_or_new(Some(&value)),
            _ => {}
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// URL path without the query string
    pub fn path(&self) -> &str {
        self.url.split_once('?').map_or(&self.url, |(p, _)| p)
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name; the last occurrence wins
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up the merged parameter bag
    #[inline]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Token the transport layer cancels when the client goes away.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Signal that the client is gone; later pipeline stages are skipped.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Parse query string parameters from a URL
///
/// Extracts everything after the `?` character and URL-decodes names and values.
pub fn parse_query_params(url: &str) -> ParamVec {
    match url.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Turn an `Accept-Language` header into an ordered list of lowercase tags.
///
/// Tags are sorted by descending q-value; equal weights keep header order.
/// `q=0` entries and the `*` wildcard are dropped.
///
/// ```rust
/// use routeweave::server::parse_accept_language;
///
/// let langs = parse_accept_language("fr;q=0.5, en-US, de;q=0");
/// assert_eq!(langs, ["en-us", "fr"]);
/// ```
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim().to_lowercase();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let mut q = 1.0_f32;
            for part in parts {
                if let Some(value) = part.trim().strip_prefix("q=") {
                    q = value.trim().parse().unwrap_or(0.0);
                }
            }
            (q > 0.0).then_some((tag, q))
        })
        .collect();
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}
