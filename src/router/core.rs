use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::storage::RouteStorage;
use crate::error::RouteError;
use crate::handler::Handler;
use crate::ids::RouteId;
use crate::middleware::{
    AuthRequirement, Authenticator, Authorizable, Middleware, MiddlewareHolder, MiddlewareSet,
    ParamMiddleware, ParamMiddlewareSet,
};
use crate::route::{normalize_path, Route, RouteMethod, RouteOptions, RoutePath};

/// A named group of routes sharing a URL prefix, middlewares and an
/// authentication policy.
///
/// Routes are registered relative to the prefix: a router with prefix `/api`
/// and a route `/users/:id` answers `/api/users/7`.
#[derive(Clone)]
pub struct Router {
    name: String,
    prefix: String,
    middlewares: MiddlewareSet,
    param_middlewares: ParamMiddlewareSet,
    auth_required: bool,
    authenticator: Option<Arc<dyn Authenticator>>,
    storage: RouteStorage,
}

impl Router {
    /// Create an empty router. The prefix loses any trailing slash; `/` and `""`
    /// both mean "no prefix".
    pub fn new(name: impl Into<String>, prefix: &str) -> Result<Self, RouteError> {
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(RouteError::InvalidPath {
                path: prefix.to_string(),
                reason: "router prefixes must start with `/`",
            });
        }
        let mut router = Self::root(name);
        if normalize_path(prefix) != "/" {
            router.prefix = normalize_path(prefix).to_string();
        }
        Ok(router)
    }

    /// Router without a prefix.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            middlewares: MiddlewareSet::new(),
            param_middlewares: ParamMiddlewareSet::new(),
            auth_required: false,
            authenticator: None,
            storage: RouteStorage::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn with_middleware(
        mut self,
        name: impl Into<String>,
        middleware: Arc<dyn Middleware>,
    ) -> Self {
        self.middlewares.insert(name, middleware);
        self
    }

    pub fn with_param_middleware(
        mut self,
        param: impl Into<String>,
        middleware: Arc<dyn ParamMiddleware>,
    ) -> Self {
        self.param_middlewares.add(param, middleware);
        self
    }

    /// Default for routes whose requirement is [`AuthRequirement::Inherit`].
    pub fn with_auth_required(mut self, required: bool) -> Self {
        self.auth_required = required;
        self
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn add_middleware(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.middlewares.insert(name, middleware);
    }

    pub fn add_param_middleware(
        &mut self,
        param: impl Into<String>,
        middleware: Arc<dyn ParamMiddleware>,
    ) {
        self.param_middlewares.add(param, middleware);
    }

    pub fn set_auth_required(&mut self, required: bool) {
        self.auth_required = required;
    }

    pub fn set_authenticator(&mut self, authenticator: Arc<dyn Authenticator>) {
        self.authenticator = Some(authenticator);
    }

    pub fn param_middlewares(&self) -> &ParamMiddlewareSet {
        &self.param_middlewares
    }

    pub fn storage(&self) -> &RouteStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut RouteStorage {
        &mut self.storage
    }

    /// Path relative to this router, or `None` if `path` lies outside the prefix.
    ///
    /// The prefix must end on a segment boundary; the prefix itself maps to `/`.
    #[inline]
    pub fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Register a handler route.
    ///
    /// # Errors
    ///
    /// Invalid method or path, a name already used in this router, or an
    /// occupied (method, path, language) slot.
    pub fn add_route(
        &mut self,
        method: &str,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        let method: RouteMethod = method.parse()?;
        let route = Route::new(method, path, handler, options)?;
        self.insert(route)
    }

    /// Register a static resource route serving files from `location`.
    pub fn resource(
        &mut self,
        prefix: &str,
        location: impl Into<PathBuf>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        let route = Route::resource(prefix, location, options)?;
        self.insert(route)
    }

    /// Register an already built route.
    pub fn insert(&mut self, route: Route) -> Result<RouteId, RouteError> {
        if let Some(name) = route.name() {
            if self.storage.find_by_name(name).is_some() {
                return Err(RouteError::DuplicateName(name.to_string()));
            }
        }
        let id = route.id();
        let route = Arc::new(route);
        self.storage.add_route(Arc::clone(&route))?;
        info!(
            router = %self.name,
            prefix = %self.prefix,
            route_id = %id,
            method = %route.method(),
            path = %route.display_path(),
            name = ?route.name(),
            language = ?route.language(),
            "Route registered"
        );
        Ok(id)
    }

    pub fn get(
        &mut self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("GET", path, handler, options)
    }

    pub fn post(
        &mut self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("POST", path, handler, options)
    }

    pub fn put(
        &mut self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("PUT", path, handler, options)
    }

    pub fn delete(
        &mut self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("DELETE", path, handler, options)
    }

    pub fn patch(
        &mut self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("PATCH", path, handler, options)
    }

    pub fn search(
        &mut self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("SEARCH", path, handler, options)
    }

    /// Route usable with every method; tried after method-specific routes.
    pub fn any(
        &mut self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("*", path, handler, options)
    }

    /// Mutate a stored route and re-index it; see [`RouteStorage::update_route`].
    pub fn update_route<F>(&mut self, id: RouteId, f: F) -> Result<Arc<Route>, RouteError>
    where
        F: FnOnce(&mut Route) -> Result<(), RouteError>,
    {
        self.storage.update_route(id, f)
    }

    pub fn remove_route(&mut self, id: RouteId) -> Option<Arc<Route>> {
        self.storage.remove_route(id)
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        self.storage.routes()
    }

    pub fn find_by_id(&self, id: RouteId) -> Option<&Arc<Route>> {
        self.storage.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.storage.find_by_name(name)
    }

    /// Middlewares that run for `route`: this router's, then the route's, with
    /// a same-named route entry replacing the router's.
    pub fn middlewares_for(&self, route: &Route) -> MiddlewareSet {
        self.middlewares.layered(route.middlewares())
    }

    /// Whether `route` needs authentication, resolving `Inherit` against this router.
    pub fn route_requires_auth(&self, route: &Route) -> bool {
        route.requires_auth(self.auth_required)
    }

    /// Authenticator for `route`: the route's own, else this router's.
    pub fn authenticator_for<'a>(
        &'a self,
        route: &'a Route,
    ) -> Option<&'a Arc<dyn Authenticator>> {
        Authorizable::authenticator(route).or(self.authenticator.as_ref())
    }
}

impl MiddlewareHolder for Router {
    fn middlewares(&self) -> &MiddlewareSet {
        &self.middlewares
    }
}

impl Authorizable for Router {
    fn auth_requirement(&self) -> AuthRequirement {
        AuthRequirement::from(self.auth_required)
    }

    fn authenticator(&self) -> Option<&Arc<dyn Authenticator>> {
        self.authenticator.as_ref()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("middlewares", &self.middlewares)
            .field("param_middlewares", &self.param_middlewares)
            .field("auth_required", &self.auth_required)
            .field("routes", &self.storage.len())
            .finish_non_exhaustive()
    }
}
