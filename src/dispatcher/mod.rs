//! # Dispatcher Module
//!
//! The request pipeline. [`Dispatcher::handle`] takes a request through:
//!
//! 1. global middlewares
//! 2. the resolution cache, then the configured [`Resolver`] on a miss (the
//!    result is written back to the cache on a background task)
//! 3. authentication, when the route or its router requires it
//! 4. router and route middlewares
//! 5. parameter middlewares, global ones before the router's
//! 6. parameter merge into [`Request::params`] (query string wins)
//! 7. the static file collaborator for resource routes, the handler otherwise
//!
//! Every step ends either in the next step or in an [`Outcome`]; only failures
//! of collaborators surface as [`PipelineError`].
//!
//! ## Concurrency
//!
//! The route table lives behind an [`arc_swap::ArcSwap`]. Each request loads one
//! snapshot and resolves against it, while [`Dispatcher::register`] clones the
//! table, applies the change and publishes the result. Requests in flight never
//! see a half-applied change.
//!
//! ## Example
//!
//! ```rust
//! use routeweave::config::EngineConfig;
//! use routeweave::dispatcher::{Dispatcher, Outcome};
//! use routeweave::handler::handler_fn;
//! use routeweave::route::RouteOptions;
//! use routeweave::server::{BufferedResponse, Request};
//! use serde_json::json;
//!
//! # tokio_test_block(async {
//! let dispatcher = Dispatcher::new(EngineConfig::default());
//! dispatcher
//!     .get(
//!         "/hello/:name",
//!         handler_fn(|req| async move { Ok(json!({ "hello": req.get_path_param("name") })) }),
//!         RouteOptions::new(),
//!     )
//!     .unwrap();
//!
//! let mut req = Request::new(http::Method::GET, "/hello/world");
//! let mut res = BufferedResponse::new();
//! let outcome = dispatcher.handle(&mut req, &mut res).await.unwrap();
//! assert_eq!(outcome.payload(), Some(&json!({ "hello": "world" })));
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! [`Resolver`]: crate::resolver::Resolver
//! [`Request::params`]: crate::server::Request::params
//! [`PipelineError`]: crate::error::PipelineError

mod core;
mod outcome;

pub use core::Dispatcher;
pub use outcome::Outcome;
