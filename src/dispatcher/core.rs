use arc_swap::ArcSwap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::Outcome;
use crate::cache::{CacheBackend, MemoryCache, ResolutionCache};
use crate::config::EngineConfig;
use crate::error::{PipelineError, RouteError};
use crate::handler::Handler;
use crate::ids::RouteId;
use crate::middleware::{
    Authenticator, Middleware, MiddlewareSet, ParamMiddleware, ParamMiddlewareSet, Rejection,
    Stage, Verdict,
};
use crate::resolver::{allowed_methods, resolver_for, RequestDescriptor, Resolution, Resolver};
use crate::route::{Route, RouteOptions, RoutePath};
use crate::router::{RouteRegistry, Router};
use crate::server::{Request, ResponseSink};
use crate::static_files::StaticFiles;

/// Request pipeline orchestrator.
///
/// Share it behind an `Arc`: [`Dispatcher::handle`] and
/// [`Dispatcher::register`] both take `&self` and may run concurrently.
pub struct Dispatcher {
    config: EngineConfig,
    registry: ArcSwap<RouteRegistry>,
    /// Serialises writers; readers never take it
    write_lock: Mutex<()>,
    resolver: Arc<dyn Resolver>,
    cache: Option<ResolutionCache>,
    middlewares: MiddlewareSet,
    param_middlewares: ParamMiddlewareSet,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("server_id", &self.config.server_id)
            .field("resolver", &self.resolver.name())
            .field("cache", &self.cache)
            .field("middlewares", &self.middlewares)
            .field("param_middlewares", &self.param_middlewares)
            .field("routes", &self.registry.load().route_count())
            .finish()
    }
}

impl Dispatcher {
    /// Empty dispatcher with the algorithm and cache settings of `config`.
    pub fn new(config: EngineConfig) -> Self {
        let cache = config.cache.enabled.then(|| {
            ResolutionCache::new(
                Arc::new(MemoryCache::new(config.cache.capacity)),
                config.server_id.clone(),
                config.cache.read_timeout(),
            )
        });
        info!(
            server_id = %config.server_id,
            algorithm = ?config.algorithm,
            cache_enabled = cache.is_some(),
            "Dispatcher created"
        );
        Self {
            resolver: resolver_for(config.algorithm),
            registry: ArcSwap::from_pointee(RouteRegistry::new()),
            write_lock: Mutex::new(()),
            cache,
            middlewares: MiddlewareSet::new(),
            param_middlewares: ParamMiddlewareSet::new(),
            authenticator: None,
            config,
        }
    }

    /// Cache resolutions in `backend` instead of the built-in memory cache.
    pub fn with_cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache = Some(ResolutionCache::new(
            backend,
            self.config.server_id.clone(),
            self.config.cache.read_timeout(),
        ));
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Fallback authenticator for routers and routes without their own.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Global middleware; runs before resolution, and its `after` hook sees
    /// every outcome.
    pub fn with_middleware(
        mut self,
        name: impl Into<String>,
        middleware: Arc<dyn Middleware>,
    ) -> Self {
        self.middlewares.insert(name, middleware);
        self
    }

    /// Global parameter middleware, run for every matched route declaring `param`.
    pub fn with_param_middleware(
        mut self,
        param: impl Into<String>,
        middleware: Arc<dyn ParamMiddleware>,
    ) -> Self {
        self.param_middlewares.add(param, middleware);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.resolver
    }

    pub fn cache(&self) -> Option<&ResolutionCache> {
        self.cache.as_ref()
    }

    /// Current route table.
    pub fn snapshot(&self) -> Arc<RouteRegistry> {
        self.registry.load_full()
    }

    /// Change the route table.
    ///
    /// `f` works on a private copy; the copy is published only if `f` succeeds,
    /// so a failed registration leaves the table untouched.
    pub fn register<T, F>(&self, f: F) -> Result<T, RouteError>
    where
        F: FnOnce(&mut RouteRegistry) -> Result<T, RouteError>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = RouteRegistry::clone(&self.registry.load_full());
        let out = f(&mut next)?;
        debug!(
            version = next.version(),
            routes = next.route_count(),
            routers = next.routers().len(),
            "Route table published"
        );
        self.registry.store(Arc::new(next));
        Ok(out)
    }

    pub fn add_router(&self, router: Router) -> Result<(), RouteError> {
        self.register(|registry| registry.add_router(router))
    }

    /// Register a handler route on the default router.
    pub fn add_route(
        &self,
        method: &str,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.register(|registry| {
            registry
                .default_router()?
                .add_route(method, path, handler, options)
        })
    }

    /// Register a static resource route on the default router.
    pub fn resource(
        &self,
        prefix: &str,
        location: impl Into<PathBuf>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.register(|registry| registry.default_router()?.resource(prefix, location, options))
    }

    pub fn get(
        &self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("GET", path, handler, options)
    }

    pub fn post(
        &self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("POST", path, handler, options)
    }

    pub fn put(
        &self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("PUT", path, handler, options)
    }

    pub fn delete(
        &self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("DELETE", path, handler, options)
    }

    pub fn patch(
        &self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("PATCH", path, handler, options)
    }

    pub fn search(
        &self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("SEARCH", path, handler, options)
    }

    pub fn any(
        &self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("*", path, handler, options)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<Route>> {
        self.registry.load().find_by_name(name).cloned()
    }

    pub fn find_by_id(&self, id: RouteId) -> Option<Arc<Route>> {
        self.registry.load().find_by_id(id).cloned()
    }

    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.registry.load().routes()
    }

    /// Resolve a request against the current table, consulting the cache.
    pub async fn resolve(&self, req: &Request) -> Option<Resolution> {
        let registry = self.registry.load_full();
        self.resolve_in(&registry, req).await
    }

    async fn resolve_in(&self, registry: &RouteRegistry, req: &Request) -> Option<Resolution> {
        let descriptor = RequestDescriptor::from(req);
        let Some(cache) = &self.cache else {
            return self.resolver.resolve(&descriptor, registry.routers());
        };

        let key = cache.key(registry.version(), &descriptor);
        let lookup_start = Instant::now();
        let entry = cache.lookup(&key).await;
        let cache_lookup = lookup_start.elapsed();

        if let Some(entry) = entry {
            let route_id = entry.route_id;
            match entry.rehydrate(registry) {
                Some(mut resolution) => {
                    resolution.stats.cache_lookup = cache_lookup;
                    return Some(resolution);
                }
                None => {
                    warn!(
                        request_id = %req.request_id,
                        cache_key = %key,
                        route_id = %route_id,
                        "Dropping resolution cache entry for unknown route"
                    );
                    cache.invalidate(key.clone());
                }
            }
        }

        let mut resolution = self.resolver.resolve(&descriptor, registry.routers())?;
        resolution.stats.cache_lookup = cache_lookup;
        resolution.stats.cached = true;
        cache.store(key, &resolution);
        Some(resolution)
    }

    /// Run `req` through the pipeline.
    ///
    /// # Errors
    ///
    /// Only collaborator failures: a middleware, authenticator or handler
    /// returning an error, a route requiring authentication with no
    /// authenticator available, or an I/O error while serving a file.
    pub async fn handle(
        &self,
        req: &mut Request,
        res: &mut dyn ResponseSink,
    ) -> Result<Outcome, PipelineError> {
        let started = Instant::now();
        let result = self.run(req, res).await;
        let latency = started.elapsed();
        match &result {
            Ok(outcome) => {
                for (_, middleware) in self.middlewares.iter() {
                    middleware.after(req, outcome, latency);
                }
            }
            Err(e) => {
                error!(
                    request_id = %req.request_id,
                    method = %req.method,
                    url = %req.url,
                    error = %e,
                    latency_ms = latency.as_millis() as u64,
                    "Request pipeline failed"
                );
            }
        }
        result
    }

    async fn run(
        &self,
        req: &mut Request,
        res: &mut dyn ResponseSink,
    ) -> Result<Outcome, PipelineError> {
        if let Some(rejection) = run_middlewares(&self.middlewares, Stage::Global, req).await? {
            return Ok(Outcome::Rejected(rejection));
        }
        if req.is_cancelled() {
            return Ok(cancelled(req, "resolution"));
        }

        let registry = self.registry.load_full();
        let Some(resolution) = self.resolve_in(&registry, req).await else {
            let allowed = allowed_methods(&RequestDescriptor::from(&*req), registry.routers());
            if allowed.is_empty() {
                info!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path(),
                    "No route found"
                );
                return Ok(Outcome::NotFound);
            }
            info!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path(),
                allowed = ?allowed,
                "Method not allowed"
            );
            return Ok(Outcome::MethodNotAllowed { allowed });
        };
        if req.is_cancelled() {
            return Ok(cancelled(req, "authentication"));
        }

        let router = Arc::clone(&resolution.router);
        let route = Arc::clone(&resolution.route);

        if router.route_requires_auth(&route) {
            let authenticator = router
                .authenticator_for(&route)
                .or(self.authenticator.as_ref())
                .ok_or(PipelineError::MissingAuthenticator(route.id()))?;
            match authenticator
                .authenticate(req)
                .await
                .map_err(PipelineError::Authenticator)?
            {
                Some(identity) => req.identity = Some(identity),
                None => {
                    info!(
                        request_id = %req.request_id,
                        route_id = %route.id(),
                        router = %router.name(),
                        "Authentication rejected"
                    );
                    return Ok(Outcome::Rejected(Rejection {
                        stage: Stage::Authentication,
                        name: None,
                        status: 401,
                        reason: "authentication required".to_string(),
                    }));
                }
            }
        }

        let middlewares = router.middlewares_for(&route);
        if let Some(rejection) = run_middlewares(&middlewares, Stage::Route, req).await? {
            return Ok(Outcome::Rejected(rejection));
        }

        for param in route.required_params().iter().chain(route.optional_params()) {
            let Some(value) = resolution.params.get(param) else {
                continue;
            };
            let checks = self
                .param_middlewares
                .for_param(param)
                .chain(router.param_middlewares().for_param(param));
            for middleware in checks {
                let verdict = middleware
                    .check(param, value, req)
                    .await
                    .map_err(|source| PipelineError::Middleware {
                        name: param.clone(),
                        source,
                    })?;
                if let Verdict::Reject { status, reason } = verdict {
                    info!(
                        request_id = %req.request_id,
                        stage = %Stage::Param,
                        param = %param,
                        status,
                        reason = %reason,
                        "Request rejected by parameter middleware"
                    );
                    return Ok(Outcome::Rejected(Rejection {
                        stage: Stage::Param,
                        name: Some(param.clone()),
                        status,
                        reason,
                    }));
                }
            }
        }

        merge_params(req, &resolution);
        if req.is_cancelled() {
            return Ok(cancelled(req, "handler"));
        }

        if route.is_resource() {
            return serve_resource(req, res, resolution).await;
        }

        let Some(handler) = route.handler() else {
            return Ok(Outcome::NotFound);
        };
        let handler_start = Instant::now();
        let payload = handler.call(req, res).await.map_err(|source| {
            error!(
                request_id = %req.request_id,
                route_id = %route.id(),
                route_path = %route.display_path(),
                error = %source,
                "Handler failed"
            );
            PipelineError::Handler {
                route: route.id(),
                source,
            }
        })?;
        debug!(
            request_id = %req.request_id,
            route_id = %route.id(),
            execution_time_us = handler_start.elapsed().as_micros() as u64,
            "Handler execution complete"
        );
        Ok(Outcome::Handled {
            payload,
            resolution,
        })
    }
}

async fn run_middlewares(
    middlewares: &MiddlewareSet,
    stage: Stage,
    req: &mut Request,
) -> Result<Option<Rejection>, PipelineError> {
    for (name, middleware) in middlewares.iter() {
        let verdict = middleware
            .before(req)
            .await
            .map_err(|source| PipelineError::Middleware {
                name: name.to_string(),
                source,
            })?;
        if let Verdict::Reject { status, reason } = verdict {
            info!(
                request_id = %req.request_id,
                stage = %stage,
                middleware = %name,
                status,
                reason = %reason,
                "Request rejected by middleware"
            );
            return Ok(Some(Rejection {
                stage,
                name: Some(name.to_string()),
                status,
                reason,
            }));
        }
    }
    Ok(None)
}

/// Path parameters go into both `path_params` and the generic `params` bag.
/// Query parameters are applied last and win on a name clash.
fn merge_params(req: &mut Request, resolution: &Resolution) {
    req.path_params = resolution
        .params
        .iter()
        .map(|(k, v)| (Arc::from(k.as_str()), v.clone()))
        .collect();
    for (name, value) in &resolution.params {
        req.params.insert(name.clone(), value.clone());
    }
    for (name, value) in &req.query_params {
        req.params.insert(name.to_string(), value.clone());
    }
}

async fn serve_resource(
    req: &Request,
    res: &mut dyn ResponseSink,
    resolution: Resolution,
) -> Result<Outcome, PipelineError> {
    let (Some(location), Some(sub_path)) = (
        resolution.route.resource_location(),
        resolution.resource_path.as_deref(),
    ) else {
        return Ok(Outcome::NotFound);
    };
    let Some(path) = StaticFiles::new(location).resolve(sub_path).await else {
        debug!(
            request_id = %req.request_id,
            route_id = %resolution.route.id(),
            sub_path = %sub_path,
            "Static file not found"
        );
        return Ok(Outcome::NotFound);
    };
    res.serve_file(&path).await?;
    debug!(
        request_id = %req.request_id,
        file = %path.display(),
        "Static file served"
    );
    Ok(Outcome::Served { path, resolution })
}

fn cancelled(req: &Request, stage: &str) -> Outcome {
    info!(
        request_id = %req.request_id,
        before_stage = stage,
        "Request cancelled"
    );
    Outcome::Cancelled
}
