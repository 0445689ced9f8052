//! # Route Module
//!
//! A [`Route`] describes one endpoint: HTTP method, path, optional language
//! variant, middlewares, per-parameter filters and authentication policy.
//!
//! ## Path Grammar
//!
//! Paths are split on `/`:
//!
//! - `:name` is a required parameter
//! - `?:name` is an optional parameter (its whole segment may be absent)
//! - anything else is matched literally
//!
//! Unfiltered parameters match `[a-zA-Z0-9_.-]+`. Filters are given per
//! parameter as a [`regex::Regex`], a keyword (`@number`, `@string`, `@alpha`,
//! `@slug`, `@uuid`, `@any`) or a pattern string.
//!
//! Paths are matched as received, so a value carrying percent-encoded octets
//! (`a%20b`) only matches a parameter whose filter admits `%`, such as `@any`.
//! Captured values are percent-decoded afterwards.
//!
//! ## Compilation
//!
//! [`compile`] produces the matching expression with surrogate-labelled
//! capture groups and the table that decodes them. Parameter-free paths compile
//! to no expression and are matched by equality.

mod compiler;
mod core;
mod filter;
mod method;

pub use compiler::{compile, compile_regex, normalize_path, CompiledPath};
pub use core::{PathKey, Route, RouteKind, RouteOptions, RoutePath};
pub use filter::{keyword_pattern, ParamFilter, DEFAULT_PARAM_PATTERN};
pub use method::{RouteMethod, SUPPORTED_METHODS};

#[cfg(test)]
mod tests;
