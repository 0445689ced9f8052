//! Middleware, parameter middleware and authentication.
//!
//! Pipeline order for a matched request:
//!
//! 1. global middlewares (registered on the dispatcher)
//! 2. authentication, when the route or its router requires it
//! 3. router middlewares, then route middlewares (a same-named route entry
//!    replaces the router's)
//! 4. parameter middlewares: global ones first, then the router's
//!
//! The first [`Verdict::Reject`] ends the request with a [`Rejection`].

mod auth;
mod core;
mod metrics;
mod tracing;

pub use auth::{AuthRequirement, Authenticator, BearerTokenAuthenticator, Identity};
pub use core::{
    Authorizable, FnMiddleware, FnParamMiddleware, Middleware, MiddlewareHolder, MiddlewareSet,
    ParamMiddleware, ParamMiddlewareSet, Rejection, Stage, Verdict,
};
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
