use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::compiler::{compile, compile_regex, normalize_path, CompiledPath};
use super::filter::ParamFilter;
use super::method::RouteMethod;
use crate::error::RouteError;
use crate::handler::Handler;
use crate::ids::RouteId;
use crate::middleware::{
    AuthRequirement, Authenticator, Authorizable, Middleware, MiddlewareHolder, MiddlewareSet,
};

/// How a route's path is expressed.
#[derive(Debug, Clone)]
pub enum RoutePath {
    /// Pattern string using the `:name` / `?:name` grammar
    Pattern(String),
    /// Pre-built expression; named groups become parameters
    Regex(Regex),
}

impl From<&str> for RoutePath {
    fn from(value: &str) -> Self {
        RoutePath::Pattern(value.to_string())
    }
}

impl From<String> for RoutePath {
    fn from(value: String) -> Self {
        RoutePath::Pattern(value)
    }
}

impl From<Regex> for RoutePath {
    fn from(value: Regex) -> Self {
        RoutePath::Regex(value)
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePath::Pattern(p) => f.write_str(p),
            RoutePath::Regex(re) => write!(f, "~{}", re.as_str()),
        }
    }
}

/// Key under which a route is indexed inside a method bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    /// Normalised parameter-free path, looked up by equality
    Literal(String),
    /// Expression signature, probed in registration order
    Pattern(String),
}

impl PathKey {
    pub fn as_str(&self) -> &str {
        match self {
            PathKey::Literal(s) | PathKey::Pattern(s) => s,
        }
    }
}

/// What a matched route does.
#[derive(Clone)]
pub enum RouteKind {
    Handler(Arc<dyn Handler>),
    /// Serves files below `location` for every URL under the route's prefix
    Resource { location: PathBuf },
}

/// Options accepted by the registration methods.
///
/// # Example
///
/// ```rust
/// use routeweave::route::RouteOptions;
/// use routeweave::middleware::AuthRequirement;
///
/// let options = RouteOptions::new()
///     .name("user.show")
///     .language("en")
///     .filter("id", "@number")
///     .auth(AuthRequirement::Required);
/// ```
#[derive(Clone, Default)]
pub struct RouteOptions {
    pub(crate) name: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) middlewares: MiddlewareSet,
    pub(crate) filters: BTreeMap<String, ParamFilter>,
    pub(crate) auth: AuthRequirement,
    pub(crate) authenticator: Option<Arc<dyn Authenticator>>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn middleware(mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.insert(name, middleware);
        self
    }

    pub fn filter(mut self, param: impl Into<String>, filter: impl Into<ParamFilter>) -> Self {
        self.filters.insert(param.into(), filter.into());
        self
    }

    pub fn auth(mut self, requirement: AuthRequirement) -> Self {
        self.auth = requirement;
        self
    }

    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }
}

/// One endpoint: method, path, language variant and what to run on a match.
///
/// The compiled form (matching expression, required/optional parameter sets,
/// surrogate table) is always derived from the current path and filters; every
/// mutator that touches either re-derives it before returning. A route that is
/// already stored must be mutated through
/// [`RouteStorage::update_route`](crate::router::RouteStorage::update_route) so
/// the index follows the change.
#[derive(Clone)]
pub struct Route {
    id: RouteId,
    name: Option<String>,
    method: RouteMethod,
    path: RoutePath,
    language: Option<String>,
    middlewares: MiddlewareSet,
    filters: BTreeMap<String, ParamFilter>,
    compiled: CompiledPath,
    auth: AuthRequirement,
    authenticator: Option<Arc<dyn Authenticator>>,
    kind: RouteKind,
}

impl Route {
    /// Build a handler route.
    ///
    /// # Errors
    ///
    /// Any configuration error of the path, filters or method.
    pub fn new(
        method: RouteMethod,
        path: impl Into<RoutePath>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Result<Self, RouteError> {
        Self::build(method, path.into(), RouteKind::Handler(handler), options)
    }

    /// Build a static resource route serving `location` under `prefix`.
    ///
    /// Resource prefixes are literal: parameter segments are rejected.
    pub fn resource(
        prefix: &str,
        location: impl Into<PathBuf>,
        options: RouteOptions,
    ) -> Result<Self, RouteError> {
        let route = Self::build(
            RouteMethod::Only(http::Method::GET),
            RoutePath::Pattern(prefix.to_string()),
            RouteKind::Resource {
                location: location.into(),
            },
            options,
        )?;
        if !route.compiled.is_literal() {
            return Err(RouteError::InvalidPath {
                path: prefix.to_string(),
                reason: "resource prefixes cannot have parameters",
            });
        }
        Ok(route)
    }

    fn build(
        method: RouteMethod,
        path: RoutePath,
        kind: RouteKind,
        options: RouteOptions,
    ) -> Result<Self, RouteError> {
        let compiled = Self::derive(&path, &options.filters)?;
        Ok(Self {
            id: RouteId::new(),
            name: options.name,
            method,
            path,
            language: options.language.map(|l| l.to_lowercase()),
            middlewares: options.middlewares,
            filters: options.filters,
            compiled,
            auth: options.auth,
            authenticator: options.authenticator,
            kind,
        })
    }

    fn derive(
        path: &RoutePath,
        filters: &BTreeMap<String, ParamFilter>,
    ) -> Result<CompiledPath, RouteError> {
        match path {
            RoutePath::Pattern(pattern) => compile(pattern, filters),
            RoutePath::Regex(re) => Ok(compile_regex(re)),
        }
    }

    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn method(&self) -> &RouteMethod {
        &self.method
    }

    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn filters(&self) -> &BTreeMap<String, ParamFilter> {
        &self.filters
    }

    pub fn compiled(&self) -> &CompiledPath {
        &self.compiled
    }

    pub fn required_params(&self) -> &[String] {
        self.compiled.required_params()
    }

    pub fn optional_params(&self) -> &[String] {
        self.compiled.optional_params()
    }

    pub fn kind(&self) -> &RouteKind {
        &self.kind
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind, RouteKind::Resource { .. })
    }

    pub fn handler(&self) -> Option<&Arc<dyn Handler>> {
        match &self.kind {
            RouteKind::Handler(h) => Some(h),
            RouteKind::Resource { .. } => None,
        }
    }

    pub fn resource_location(&self) -> Option<&Path> {
        match &self.kind {
            RouteKind::Resource { location } => Some(location),
            RouteKind::Handler(_) => None,
        }
    }

    /// Index key: literal path for parameter-free routes, signature otherwise.
    pub fn path_key(&self) -> PathKey {
        if self.compiled.is_literal() {
            PathKey::Literal(self.compiled.signature().to_string())
        } else {
            PathKey::Pattern(self.compiled.signature().to_string())
        }
    }

    /// Test a router-relative, normalised path against this route.
    #[inline]
    pub fn matches_path(&self, path: &str) -> bool {
        self.compiled.is_match(path)
    }

    /// Residual file path for a resource route, if `path` lies under its prefix.
    ///
    /// The prefix must end on a segment boundary: `/static` covers `/static` and
    /// `/static/app.js`, never `/staticfoo`.
    pub fn resource_sub_path(&self, path: &str) -> Option<String> {
        if !self.is_resource() {
            return None;
        }
        let prefix = self.compiled.signature();
        if prefix == "/" {
            return Some(path.trim_start_matches('/').to_string());
        }
        let rest = path.strip_prefix(prefix)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest.trim_start_matches('/').to_string())
        } else {
            None
        }
    }

    /// Replace the path and re-derive the compiled form.
    ///
    /// On error the route is left unchanged.
    pub fn set_path(&mut self, path: impl Into<RoutePath>) -> Result<(), RouteError> {
        let path = path.into();
        let compiled = Self::derive(&path, &self.filters)?;
        if self.is_resource() && !compiled.is_literal() {
            return Err(RouteError::InvalidPath {
                path: path.to_string(),
                reason: "resource prefixes cannot have parameters",
            });
        }
        self.path = path;
        self.compiled = compiled;
        Ok(())
    }

    /// Add or replace one parameter filter and re-derive the compiled form.
    pub fn set_filter(
        &mut self,
        param: impl Into<String>,
        filter: impl Into<ParamFilter>,
    ) -> Result<(), RouteError> {
        let mut filters = self.filters.clone();
        filters.insert(param.into(), filter.into());
        let compiled = Self::derive(&self.path, &filters)?;
        self.filters = filters;
        self.compiled = compiled;
        Ok(())
    }

    /// Change the method. Resource routes only serve `GET`.
    pub fn set_method(&mut self, method: RouteMethod) -> Result<(), RouteError> {
        if self.is_resource() && method != RouteMethod::Only(http::Method::GET) {
            return Err(RouteError::InvalidMethod(method.to_string()));
        }
        self.method = method;
        Ok(())
    }

    pub fn set_language(&mut self, language: Option<String>) {
        self.language = language.map(|l| l.to_lowercase());
    }

    /// Normalised literal path or prefix, used in logs and conflict errors.
    pub fn display_path(&self) -> String {
        match &self.path {
            RoutePath::Pattern(p) => normalize_path(p).to_string(),
            RoutePath::Regex(_) => self.path.to_string(),
        }
    }
}

impl MiddlewareHolder for Route {
    fn middlewares(&self) -> &MiddlewareSet {
        &self.middlewares
    }
}

impl Authorizable for Route {
    fn auth_requirement(&self) -> AuthRequirement {
        self.auth
    }

    fn authenticator(&self) -> Option<&Arc<dyn Authenticator>> {
        self.authenticator.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("language", &self.language)
            .field("middlewares", &self.middlewares)
            .field("auth", &self.auth)
            .field("resource", &self.resource_location())
            .finish_non_exhaustive()
    }
}
