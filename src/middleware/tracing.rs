use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use super::{Middleware, Verdict};
use crate::dispatcher::Outcome;
use crate::server::Request;

/// Logs one event when a request enters the pipeline and one when it leaves,
/// correlated by request id.
pub struct TracingMiddleware;

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn before(&self, req: &mut Request) -> anyhow::Result<Verdict> {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            url = %req.url,
            languages = ?req.accepted_languages,
            "Request started"
        );
        Ok(Verdict::Continue)
    }

    fn after(&self, req: &Request, outcome: &Outcome, latency: Duration) {
        let status = outcome.status();
        let route = outcome
            .resolution()
            .and_then(|r| r.route.name().map(str::to_string));
        if status >= 500 {
            warn!(
                request_id = %req.request_id,
                status,
                route = ?route,
                latency_ms = latency.as_millis() as u64,
                "Request finished"
            );
        } else {
            info!(
                request_id = %req.request_id,
                status,
                route = ?route,
                from_cache = outcome.resolution().is_some_and(|r| r.stats.from_cache),
                latency_ms = latency.as_millis() as u64,
                "Request finished"
            );
        }
    }
}
