//! # Router Module
//!
//! Route groups and their indexes.
//!
//! - [`Router`]: a named group of routes with a shared URL prefix, middleware
//!   list and authentication default
//! - [`RouteStorage`]: the layered index behind one router (resource prefixes,
//!   then `method -> path key -> language`)
//! - [`RouteRegistry`]: the ordered set of routers a resolver walks, with a
//!   version number bumped by every change
//!
//! ## Example
//!
//! ```rust
//! use routeweave::handler::handler_fn;
//! use routeweave::route::RouteOptions;
//! use routeweave::router::{RouteRegistry, Router};
//! use serde_json::json;
//!
//! let mut registry = RouteRegistry::new();
//! registry.add_router(Router::new("api", "/api").unwrap()).unwrap();
//! registry
//!     .router("api")
//!     .unwrap()
//!     .get(
//!         "/users/:id",
//!         handler_fn(|req| async move { Ok(json!({ "id": req.get_path_param("id") })) }),
//!         RouteOptions::new().name("user.show").filter("id", "@number"),
//!     )
//!     .unwrap();
//! assert!(registry.find_by_name("user.show").is_some());
//! ```

mod core;
mod registry;
mod storage;

pub use core::Router;
pub use registry::{RouteRegistry, RouterHandle, DEFAULT_ROUTER};
pub use storage::{IndexStats, MethodBucket, RouteStorage, Variants};
