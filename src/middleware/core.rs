use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{AuthRequirement, Authenticator};
use crate::dispatcher::Outcome;
use crate::server::Request;

/// Decision returned by a middleware's `before` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Reject { status: u16, reason: String },
}

impl Verdict {
    pub fn reject(status: u16, reason: impl Into<String>) -> Self {
        Verdict::Reject {
            status,
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::reject(403, reason)
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Verdict::Continue)
    }
}

/// Pipeline stage that produced a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Global,
    Authentication,
    Route,
    Param,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Global => "global",
            Stage::Authentication => "authentication",
            Stage::Route => "route",
            Stage::Param => "param",
        })
    }
}

/// A vetoed request: which stage stopped it and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub stage: Stage,
    /// Middleware name, or the parameter name for param middlewares
    pub name: Option<String>,
    pub status: u16,
    pub reason: String,
}

/// Request middleware.
///
/// `before` runs ahead of the handler and may veto the request. `after` is only
/// called for global middlewares, once the pipeline has produced an outcome.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn before(&self, _req: &mut Request) -> anyhow::Result<Verdict> {
        Ok(Verdict::Continue)
    }

    fn after(&self, _req: &Request, _outcome: &Outcome, _latency: Duration) {}
}

/// Middleware bound to one path parameter; sees the decoded value.
#[async_trait]
pub trait ParamMiddleware: Send + Sync {
    async fn check(&self, param: &str, value: &str, req: &Request) -> anyhow::Result<Verdict>;
}

/// Synchronous closure middleware.
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&Request) -> Verdict + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }

    pub fn shared(f: F) -> Arc<dyn Middleware> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&Request) -> Verdict + Send + Sync + 'static,
{
    async fn before(&self, req: &mut Request) -> anyhow::Result<Verdict> {
        Ok((self.f)(req))
    }
}

/// Synchronous closure parameter middleware, called with the decoded value.
pub struct FnParamMiddleware<F> {
    f: F,
}

impl<F> FnParamMiddleware<F>
where
    F: Fn(&str, &Request) -> Verdict + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }

    pub fn shared(f: F) -> Arc<dyn ParamMiddleware> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> ParamMiddleware for FnParamMiddleware<F>
where
    F: Fn(&str, &Request) -> Verdict + Send + Sync + 'static,
{
    async fn check(&self, _param: &str, value: &str, req: &Request) -> anyhow::Result<Verdict> {
        Ok((self.f)(value, req))
    }
}

/// Ordered, named middleware list. Inserting an existing name replaces the
/// entry in place.
#[derive(Clone, Default)]
pub struct MiddlewareSet {
    entries: Vec<(String, Arc<dyn Middleware>)>,
}

impl MiddlewareSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = middleware,
            None => self.entries.push((name, middleware)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Middleware>> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Middleware>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Middleware>)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    /// This set followed by `overrides`: an override with a name already present
    /// takes over that position, new names are appended.
    pub fn layered(&self, overrides: &MiddlewareSet) -> MiddlewareSet {
        let mut merged = self.clone();
        for (name, middleware) in &overrides.entries {
            merged.insert(name.clone(), Arc::clone(middleware));
        }
        merged
    }
}

impl fmt::Debug for MiddlewareSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Parameter middlewares keyed by parameter name, in registration order.
#[derive(Clone, Default)]
pub struct ParamMiddlewareSet {
    entries: Vec<(String, Arc<dyn ParamMiddleware>)>,
}

impl ParamMiddlewareSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, param: impl Into<String>, middleware: Arc<dyn ParamMiddleware>) {
        self.entries.push((param.into(), middleware));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Middlewares registered for `param`
    pub fn for_param<'a>(
        &'a self,
        param: &'a str,
    ) -> impl Iterator<Item = &'a Arc<dyn ParamMiddleware>> + 'a {
        self.entries
            .iter()
            .filter(move |(p, _)| p == param)
            .map(|(_, m)| m)
    }
}

impl fmt::Debug for ParamMiddlewareSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(p, _)| p))
            .finish()
    }
}

/// Something that carries a named middleware list (routes and routers).
pub trait MiddlewareHolder {
    fn middlewares(&self) -> &MiddlewareSet;

    fn has_middleware(&self, name: &str) -> bool {
        self.middlewares().get(name).is_some()
    }
}

/// Something with an authentication policy (routes and routers).
pub trait Authorizable {
    fn auth_requirement(&self) -> AuthRequirement;

    fn authenticator(&self) -> Option<&Arc<dyn Authenticator>>;

    /// Effective requirement, with `Inherit` falling back to `inherited`.
    fn requires_auth(&self, inherited: bool) -> bool {
        self.auth_requirement().resolve(inherited)
    }
}
