use std::path::PathBuf;
use std::sync::Arc;

use super::core::Router;
use crate::error::RouteError;
use crate::handler::Handler;
use crate::ids::RouteId;
use crate::route::{Route, RouteOptions, RoutePath};

/// Name of the router created with every registry
pub const DEFAULT_ROUTER: &str = "";

/// Ordered set of routers; the unit the resolvers and the dispatcher work on.
///
/// Routers and routes are `Arc`-shared, so cloning a registry is shallow. The
/// dispatcher publishes a fresh clone for every change, and
/// [`RouteRegistry::version`] identifies which table a cached resolution was
/// computed against.
#[derive(Debug, Clone)]
pub struct RouteRegistry {
    routers: Vec<Arc<Router>>,
    version: u64,
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteRegistry {
    /// Registry holding only the default router (no prefix).
    pub fn new() -> Self {
        Self {
            routers: vec![Arc::new(Router::root(DEFAULT_ROUTER))],
            version: 0,
        }
    }

    /// Incremented by every successful mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Routers in registration order; the default router comes first.
    pub fn routers(&self) -> &[Arc<Router>] {
        &self.routers
    }

    pub fn get_router(&self, name: &str) -> Option<&Arc<Router>> {
        self.routers.iter().find(|r| r.name() == name)
    }

    /// Append a router. Its routes' names must not clash with registered ones.
    pub fn add_router(&mut self, router: Router) -> Result<(), RouteError> {
        if self.get_router(router.name()).is_some() {
            return Err(RouteError::DuplicateRouter(router.name().to_string()));
        }
        for route in router.routes() {
            if let Some(name) = route.name() {
                if self.find_by_name(name).is_some() {
                    return Err(RouteError::DuplicateName(name.to_string()));
                }
            }
        }
        self.routers.push(Arc::new(router));
        self.version += 1;
        Ok(())
    }

    pub fn remove_router(&mut self, name: &str) -> Option<Arc<Router>> {
        let pos = self.routers.iter().position(|r| r.name() == name)?;
        self.version += 1;
        Some(self.routers.remove(pos))
    }

    /// Mutable access to one router's routes.
    pub fn router(&mut self, name: &str) -> Result<RouterHandle<'_>, RouteError> {
        let index = self
            .routers
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| RouteError::UnknownRouter(name.to_string()))?;
        Ok(RouterHandle {
            registry: self,
            index,
        })
    }

    pub fn default_router(&mut self) -> Result<RouterHandle<'_>, RouteError> {
        self.router(DEFAULT_ROUTER)
    }

    /// Route with `name` in any router
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.routers.iter().find_map(|r| r.find_by_name(name))
    }

    pub fn find_by_id(&self, id: RouteId) -> Option<&Arc<Route>> {
        self.find_route(id).map(|(_, route)| route)
    }

    /// Route with `id` together with the router owning it
    pub fn find_route(&self, id: RouteId) -> Option<(&Arc<Router>, &Arc<Route>)> {
        self.routers
            .iter()
            .find_map(|router| router.find_by_id(id).map(|route| (router, route)))
    }

    /// Every route of every router, routers in order
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.routers
            .iter()
            .flat_map(|r| r.routes().iter().cloned())
            .collect()
    }

    pub fn route_count(&self) -> usize {
        self.routers.iter().map(|r| r.routes().len()).sum()
    }
}

/// Mutable view of one router inside a [`RouteRegistry`].
///
/// Route names are checked against the whole registry, not just this router.
pub struct RouterHandle<'a> {
    registry: &'a mut RouteRegistry,
    index: usize,
}

impl RouterHandle<'_> {
    pub fn router(&self) -> &Router {
        &self.registry.routers[self.index]
    }

    fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut Router) -> Result<T, RouteError>,
    ) -> Result<T, RouteError> {
        let router = Arc::make_mut(&mut self.registry.routers[self.index]);
        let out = f(router)?;
        self.registry.version += 1;
        Ok(out)
    }

    fn check_name(&self, options: &RouteOptions) -> Result<(), RouteError> {
        match options.name.as_deref() {
            Some(name) if self.registry.find_by_name(name).is_some() => {
                Err(RouteError::DuplicateName(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Change router-level settings (middlewares, auth policy).
    pub fn configure(&mut self, f: impl FnOnce(&mut Router)) {
        let router = Arc::make_mut(&mut self.registry.routers[self.index]);
        f(router);
        self.registry.version += 1;
    }

    pub fn add_route(
        &mut self,
        method: &str,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.check_name(&options)?;
        self.mutate(|router| router.add_route(method, path, handler, options))
    }

    pub fn resource(
        &mut self,
        prefix: &str,
        location: impl Into<PathBuf>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.check_name(&options)?;
        self.mutate(|router| router.resource(prefix, location, options))
    }

    pub fn insert(&mut self, route: Route) -> Result<RouteId, RouteError> {
        if let Some(name) = route.name() {
            if self.registry.find_by_name(name).is_some() {
                return Err(RouteError::DuplicateName(name.to_string()));
            }
        }
        self.mutate(|router| router.insert(route))
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

    pub fn any(
        &mut self,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<RouteId, RouteError> {
        self.add_route("*", path, handler, options)
    }

    pub fn update_route<F>(&mut self, id: RouteId, f: F) -> Result<Arc<Route>, RouteError>
    where
        F: FnOnce(&mut Route) -> Result<(), RouteError>,
    {
        if self.router().find_by_id(id).is_none() {
            return Err(RouteError::UnknownRoute(id));
        }
        self.mutate(|router| router.update_route(id, f))
    }

    pub fn remove_route(&mut self, id: RouteId) -> Result<Arc<Route>, RouteError> {
        if self.router().find_by_id(id).is_none() {
            return Err(RouteError::UnknownRoute(id));
        }
        self.mutate(|router| router.remove_route(id).ok_or(RouteError::UnknownRoute(id)))
    }
}
