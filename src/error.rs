//! # Error Module
//!
//! Two error families cover everything that can propagate out of the public API:
//!
//! - [`RouteError`] - configuration errors, raised synchronously while routes are
//!   constructed, registered or mutated. A route that fails validation never reaches
//!   the index.
//! - [`PipelineError`] - unrecovered failures while a request runs through the
//!   pipeline (a middleware, authenticator or handler returned an error).
//!
//! Routine outcomes of normal traffic (no route found, method not allowed, a
//! middleware veto, a broken cache entry) are **not** errors; they are modelled as
//! [`crate::dispatcher::Outcome`] values.

use crate::ids::RouteId;

/// Configuration-time error for route construction and registration.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Path pattern or router prefix that cannot be compiled or indexed
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// HTTP method outside the supported set
    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    /// A route with the same name is already registered
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),

    /// The same parameter name occurs twice in one pattern
    #[error("duplicate parameter `{param}` in path `{path}`")]
    DuplicateParam { param: String, path: String },

    /// Parameter segment without a name (`/:` or `/?:`)
    #[error("empty parameter name in path `{0}`")]
    EmptyParam(String),

    /// Filter keyword (e.g. `@number`) not present in the built-in table
    #[error("unknown filter keyword `{0}`")]
    UnknownFilterKeyword(String),

    /// Compiled pattern or filter is not a valid regular expression
    #[error("invalid pattern for path `{path}`: {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },

    /// Another route already occupies the (method, path, language) slot
    #[error("route conflict: {method} {path} (language: {})", language.as_deref().unwrap_or("*"))]
    Conflict {
        method: String,
        path: String,
        language: Option<String>,
    },

    /// Operation on a route that was never added to the storage
    #[error("route {0} is not registered")]
    UnknownRoute(RouteId),

    /// No router with the given name
    #[error("router `{0}` is not registered")]
    UnknownRouter(String),

    /// A router with the given name already exists
    #[error("router `{0}` is already registered")]
    DuplicateRouter(String),
}

/// Request-time failure that the pipeline could not turn into an [`Outcome`].
///
/// [`Outcome`]: crate::dispatcher::Outcome
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("middleware `{name}` failed: {source}")]
    Middleware {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("authenticator failed: {0}")]
    Authenticator(#[source] anyhow::Error),

    /// Route (or its router) requires authentication but nothing can perform it
    #[error("route {0} requires authentication but no authenticator is configured")]
    MissingAuthenticator(RouteId),

    #[error("handler for route {route} failed: {source}")]
    Handler {
        route: RouteId,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to serve static file: {0}")]
    StaticFile(#[from] std::io::Error),
}
