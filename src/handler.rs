//! Route handlers.
//!
//! A handler receives the request (with path parameters and identity already
//! filled in) and the response sink. Its return value is the raw payload that
//! an output-serialisation stage outside this crate turns into a body.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::server::{Request, ResponseSink};

#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, req: &Request, res: &mut dyn ResponseSink) -> anyhow::Result<Value>;
}

/// Adapter turning an async closure over an owned [`Request`] into a [`Handler`].
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn call(&self, req: &Request, _res: &mut dyn ResponseSink) -> anyhow::Result<Value> {
        (self.f)(req.clone()).await
    }
}

/// Wrap a closure as a shareable handler.
///
/// ```rust
/// use routeweave::handler::handler_fn;
/// use serde_json::json;
///
/// let show = handler_fn(|req| async move {
///     Ok(json!({ "id": req.get_path_param("id") }))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}
