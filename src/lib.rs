//! # routeweave
//!
//! **routeweave** is the routing core of a web application framework: it indexes
//! routes by method, path pattern and language, resolves incoming requests to
//! exactly one route, caches resolutions, and runs the middleware and
//! authentication pipeline around the route's handler.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`route`]** - Route model and the path compiler (`/users/:id/?:page` to regex)
//! - **[`router`]** - Route groups with a URL prefix, their layered index, and the registry
//! - **[`resolver`]** - Linear and indexed resolution algorithms with one precedence rule
//! - **[`cache`]** - Resolution cache over a pluggable asynchronous backend
//! - **[`middleware`]** - Middleware, parameter middleware and authenticators
//! - **[`dispatcher`]** - The request pipeline tying everything together
//! - **[`server`]** - Transport-neutral request descriptor and response sink
//! - **[`static_files`]** - File lookup for static resource routes
//! - **[`config`]** / **[`logging`]** - Engine configuration and `tracing` setup
//!
//! ### Request Handling Flow
//!
//! ```text
//! Request
//!   -> global middlewares            (veto => Outcome::Rejected)
//!   -> resolution cache lookup       (hit => skip matching)
//!   -> resolver over the routers     (miss => NotFound / MethodNotAllowed)
//!   -> authentication                (route or router policy)
//!   -> router + route middlewares
//!   -> parameter middlewares         (global, then router)
//!   -> parameter merge               (query string wins)
//!   -> static file | handler         (Outcome::Served / Outcome::Handled)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use routeweave::config::EngineConfig;
//! use routeweave::dispatcher::Dispatcher;
//! use routeweave::handler::handler_fn;
//! use routeweave::route::RouteOptions;
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new(EngineConfig::default());
//! dispatcher
//!     .get(
//!         "/articles/:id",
//!         handler_fn(|req| async move { Ok(json!({ "id": req.get_path_param("id") })) }),
//!         RouteOptions::new().name("article").filter("id", "@number"),
//!     )
//!     .unwrap();
//! assert!(dispatcher.find_by_name("article").is_some());
//! ```
//!
//! ## Runtime Considerations
//!
//! Matching is synchronous CPU work; the pipeline's suspension points are the
//! cache, the middlewares, the authenticator and the handler. Route tables are
//! copy-on-write snapshots, so registration may happen from any task while
//! requests are being served.

pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod resolver;
pub mod route;
pub mod router;
pub mod server;
pub mod static_files;

pub use config::{Algorithm, EngineConfig};
pub use dispatcher::{Dispatcher, Outcome};
pub use error::{PipelineError, RouteError};
pub use ids::{RequestId, RouteId};
pub use resolver::{Resolution, Resolver};
pub use route::{Route, RouteOptions};
pub use router::{RouteRegistry, Router};
