#![allow(dead_code)]

pub mod handlers {
    use routeweave::handler::{handler_fn, Handler};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub fn noop() -> Arc<dyn Handler> {
        handler_fn(|_| async { Ok(Value::Null) })
    }

    /// Returns the merged parameter bag
    pub fn echo_params() -> Arc<dyn Handler> {
        handler_fn(|req| async move { Ok(json!(req.params)) })
    }

    /// Returns a fixed tag, to tell routes apart
    pub fn tagged(tag: &'static str) -> Arc<dyn Handler> {
        handler_fn(move |_| async move { Ok(json!(tag)) })
    }

    pub fn counting(calls: &Arc<AtomicUsize>) -> Arc<dyn Handler> {
        let calls = Arc::clone(calls);
        handler_fn(move |_| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            }
        })
    }
}

pub mod resolvers {
    use routeweave::resolver::{Candidate, RequestDescriptor, Resolver};
    use routeweave::router::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Wraps a resolver and counts calls into the matching algorithm.
    pub struct CountingResolver {
        inner: Arc<dyn Resolver>,
        calls: AtomicUsize,
    }

    impl CountingResolver {
        pub fn new(inner: Arc<dyn Resolver>) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Resolver for CountingResolver {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn find<'r>(
            &self,
            req: &RequestDescriptor<'_>,
            routers: &'r [Arc<Router>],
        ) -> Option<Candidate<'r>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find(req, routers)
        }
    }
}

pub mod pipeline {
    use routeweave::dispatcher::{Dispatcher, Outcome};
    use routeweave::server::{BufferedResponse, Request};

    pub async fn dispatch(dispatcher: &Dispatcher, req: Request) -> (Outcome, BufferedResponse) {
        let mut req = req;
        let mut res = BufferedResponse::new();
        let outcome = dispatcher.handle(&mut req, &mut res).await.unwrap();
        (outcome, res)
    }

    /// Yield until `done` holds; spawned cache writes need a few scheduler turns.
    pub async fn settle(mut done: impl FnMut() -> bool) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }
}
