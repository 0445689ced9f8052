use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::Outcome;
use crate::server::Request;

/// Middleware collecting request statistics.
///
/// All counters use atomic operations for thread-safe updates without locks.
/// The middleware is passive: it never vetoes a request.
///
/// Metrics collected:
/// - Total request count and average latency
/// - Requests rejected by a middleware or authenticator
/// - Requests that resolved to no route (404 and 405)
/// - Requests whose route came from the resolution cache
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    rejected: AtomicUsize,
    unmatched: AtomicUsize,
    cache_hits: AtomicUsize,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of requests that completed the pipeline
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean processing time; zero before the first request
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn unmatched(&self) -> usize {
        self.unmatched.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }
}

impl Middleware for MetricsMiddleware {
    fn after(&self, _req: &Request, outcome: &Outcome, latency: Duration) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        match outcome {
            Outcome::Rejected(_) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::NotFound | Outcome::MethodNotAllowed { .. } => {
                self.unmatched.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        if outcome.resolution().is_some_and(|r| r.stats.from_cache) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
    }
}
