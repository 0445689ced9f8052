use http::Method;
use std::sync::Arc;

use super::language::pick;
use super::{Candidate, RequestDescriptor, Resolver};
use crate::route::{Route, RouteMethod};
use crate::router::{MethodBucket, Router};

/// Walks each router's layered index instead of scanning routes.
///
/// Literal paths are a hash lookup and only pattern keys of the request's
/// method (and of the wildcard bucket) are probed, so the cost stays flat as
/// unrelated routes are added.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsetResolver;

impl SubsetResolver {
    fn probe<'r>(bucket: &'r MethodBucket, path: &str, languages: &[String]) -> Option<&'r Arc<Route>> {
        if let Some(route) = bucket
            .literal(path)
            .and_then(|variants| pick(variants.iter(), languages))
        {
            return Some(route);
        }
        bucket
            .patterns()
            .filter(|(_, variants)| variants.first().is_some_and(|r| r.matches_path(path)))
            .find_map(|(_, variants)| pick(variants.iter(), languages))
    }

    fn walk<'r>(router: &'r Router, path: &str, req: &RequestDescriptor<'_>) -> Option<&'r Arc<Route>> {
        let storage = router.storage();
        if *req.method == Method::GET && storage.has_resources() {
            let resource = storage
                .resources_matching(path)
                .into_iter()
                .find_map(|(_, variants)| pick(variants.iter(), req.languages));
            if resource.is_some() {
                return resource;
            }
        }
        let specific = RouteMethod::Only(req.method.clone());
        [storage.bucket(&specific), storage.bucket(&RouteMethod::Any)]
            .into_iter()
            .flatten()
            .find_map(|bucket| Self::probe(bucket, path, req.languages))
    }
}

impl Resolver for SubsetResolver {
    fn name(&self) -> &'static str {
        "subset"
    }

    fn find<'r>(
        &self,
        req: &RequestDescriptor<'_>,
        routers: &'r [Arc<Router>],
    ) -> Option<Candidate<'r>> {
        routers.iter().find_map(|router| {
            let path = router.strip_prefix(req.path)?;
            Self::walk(router, path, req).map(|route| Candidate { router, route })
        })
    }
}
