//! # Resolver Module
//!
//! Maps a request (method, path, accepted languages) to the single route that
//! serves it. Two interchangeable algorithms implement [`Resolver`]:
//!
//! - [`LinearResolver`] scans every route of every router
//! - [`SubsetResolver`] walks each router's layered index
//!
//! Both apply the same precedence, so they always agree:
//!
//! 1. routers in registration order; a router whose prefix does not cover the
//!    path is skipped, and the first router with a match wins
//! 2. within a router: resource prefixes (GET only, longest first), then
//!    method-specific literal paths, method-specific patterns, wildcard-method
//!    literals, wildcard-method patterns
//! 3. within a class, path keys in registration order
//! 4. within a path key, the preferred-language walk ([`language::pick`])

pub mod language;
mod linear;
mod subset;

pub use linear::LinearResolver;
pub use subset::SubsetResolver;

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Algorithm;
use crate::route::{normalize_path, Route, RouteMethod, SUPPORTED_METHODS};
use crate::router::Router;
use crate::server::Request;

/// Matching above this duration is logged as slow
pub const SLOW_MATCH_THRESHOLD: Duration = Duration::from_millis(1);

/// What a resolver needs to know about a request.
#[derive(Debug, Clone, Copy)]
pub struct RequestDescriptor<'a> {
    pub method: &'a Method,
    /// Path without query string or trailing slash
    pub path: &'a str,
    /// Preferred languages, most preferred first
    pub languages: &'a [String],
}

impl<'a> RequestDescriptor<'a> {
    pub fn new(method: &'a Method, url: &'a str, languages: &'a [String]) -> Self {
        let path = url.split_once('?').map_or(url, |(p, _)| p);
        Self {
            method,
            path: normalize_path(path),
            languages,
        }
    }
}

impl<'a> From<&'a Request> for RequestDescriptor<'a> {
    fn from(req: &'a Request) -> Self {
        Self::new(&req.method, &req.url, &req.accepted_languages)
    }
}

/// Timing and cache bookkeeping for one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub cache_lookup: Duration,
    /// Zero when the result came from the cache
    pub matching: Duration,
    pub params: Duration,
    pub from_cache: bool,
    /// A cache write was scheduled for this result
    pub cached: bool,
}

/// A matched route with everything the pipeline needs to run it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub route: Arc<Route>,
    pub router: Arc<Router>,
    /// Language of the chosen variant
    pub language: Option<String>,
    /// Decoded path parameters; empty for parameter-free routes
    pub params: HashMap<String, String>,
    /// Residual file path below the prefix of a resource route
    pub resource_path: Option<String>,
    pub stats: ResolutionStats,
}

impl Resolution {
    pub fn is_resource(&self) -> bool {
        self.route.is_resource()
    }
}

/// Route picked by an algorithm, before parameter decoding.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'r> {
    pub router: &'r Arc<Router>,
    pub route: &'r Arc<Route>,
}

/// Resolution algorithm.
pub trait Resolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pick the winning route, or `None`.
    fn find<'r>(
        &self,
        req: &RequestDescriptor<'_>,
        routers: &'r [Arc<Router>],
    ) -> Option<Candidate<'r>>;

    /// Pick the winning route and decode its parameters.
    fn resolve(
        &self,
        req: &RequestDescriptor<'_>,
        routers: &[Arc<Router>],
    ) -> Option<Resolution> {
        debug!(
            method = %req.method,
            path = %req.path,
            languages = ?req.languages,
            algorithm = self.name(),
            "Route match attempt"
        );

        let match_start = Instant::now();
        let found = self.find(req, routers);
        let matching = match_start.elapsed();

        let Some(Candidate { router, route }) = found else {
            debug!(
                method = %req.method,
                path = %req.path,
                duration_us = matching.as_micros(),
                algorithm = self.name(),
                "No route matched"
            );
            return None;
        };

        let params_start = Instant::now();
        let relative = router.strip_prefix(req.path).unwrap_or(req.path);
        let (params, resource_path) = if route.is_resource() {
            (HashMap::new(), route.resource_sub_path(relative))
        } else {
            (route.compiled().captures(relative).unwrap_or_default(), None)
        };
        let params_time = params_start.elapsed();

        if matching > SLOW_MATCH_THRESHOLD {
            warn!(
                method = %req.method,
                path = %req.path,
                router = %router.name(),
                route_id = %route.id(),
                route_path = %route.display_path(),
                duration_us = matching.as_micros(),
                algorithm = self.name(),
                "Slow route matching detected"
            );
        } else {
            info!(
                method = %req.method,
                path = %req.path,
                router = %router.name(),
                route_id = %route.id(),
                route_path = %route.display_path(),
                language = ?route.language(),
                path_params = ?params,
                duration_us = matching.as_micros(),
                algorithm = self.name(),
                "Route matched"
            );
        }

        Some(Resolution {
            route: Arc::clone(route),
            router: Arc::clone(router),
            language: route.language().map(str::to_string),
            params,
            resource_path,
            stats: ResolutionStats {
                matching,
                params: params_time,
                ..ResolutionStats::default()
            },
        })
    }
}

/// Resolver for the configured algorithm
pub fn resolver_for(algorithm: Algorithm) -> Arc<dyn Resolver> {
    match algorithm {
        Algorithm::Linear => Arc::new(LinearResolver),
        Algorithm::Subset => Arc::new(SubsetResolver),
    }
}

/// Methods other than the request's own under which some router has a route
/// for this path.
///
/// Used to tell "method not allowed" from "not found" once resolution failed.
/// The request's method is never listed: a miss under it (a filter or
/// language mismatch) is "not found". Ordered like [`SUPPORTED_METHODS`].
pub fn allowed_methods(req: &RequestDescriptor<'_>, routers: &[Arc<Router>]) -> Vec<Method> {
    let mut allowed: Vec<Method> = Vec::new();
    for router in routers {
        let Some(relative) = router.strip_prefix(req.path) else {
            continue;
        };
        let storage = router.storage();
        let has_resource = !storage.resources_matching(relative).is_empty();
        if has_resource && *req.method != Method::GET && !allowed.contains(&Method::GET) {
            allowed.push(Method::GET);
        }
        for (method, bucket) in storage.methods() {
            let RouteMethod::Only(method) = method else {
                continue;
            };
            if method == req.method || allowed.contains(method) {
                continue;
            }
            // variants of one key share a signature, so the first stands for all
            let hit = bucket.literal(relative).is_some()
                || bucket
                    .patterns()
                    .any(|(_, v)| v.first().is_some_and(|r| r.matches_path(relative)));
            if hit {
                allowed.push(method.clone());
            }
        }
    }
    allowed.sort_by_key(|m| {
        SUPPORTED_METHODS
            .iter()
            .position(|s| *s == m.as_str())
            .unwrap_or(SUPPORTED_METHODS.len())
    });
    allowed
}

#[cfg(test)]
mod tests;
