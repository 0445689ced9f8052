use http::Method;
use std::cmp::Reverse;
use std::sync::Arc;

use super::language::pick;
use super::{Candidate, RequestDescriptor, Resolver};
use crate::route::{Route, RouteMethod};
use crate::router::Router;

/// Exhaustive scan over every route of every router.
///
/// Needs no index and is the easier algorithm to reason about; cost grows with
/// the number of routes, so it suits small tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    MethodLiteral,
    MethodPattern,
    AnyLiteral,
    AnyPattern,
}

fn class_of(route: &Route, method: &Method) -> Option<Class> {
    let literal = route.compiled().is_literal();
    match route.method() {
        RouteMethod::Only(m) if m == method => Some(if literal {
            Class::MethodLiteral
        } else {
            Class::MethodPattern
        }),
        RouteMethod::Any => Some(if literal {
            Class::AnyLiteral
        } else {
            Class::AnyPattern
        }),
        RouteMethod::Only(_) => None,
    }
}

type Group<'r> = Vec<(Option<&'r str>, &'r Arc<Route>)>;

fn push_variant<'r, K: PartialEq>(groups: &mut Vec<(K, Group<'r>)>, key: K, route: &'r Arc<Route>) {
    let entry = (route.language(), route);
    match groups.iter_mut().find(|(k, _)| *k == key) {
        Some((_, group)) => group.push(entry),
        None => groups.push((key, vec![entry])),
    }
}

impl LinearResolver {
    fn scan<'r>(router: &'r Router, path: &str, req: &RequestDescriptor<'_>) -> Option<&'r Arc<Route>> {
        let mut resources: Vec<(&'r str, Group<'r>)> = Vec::new();
        let mut regular: Vec<((Class, &'r str), Group<'r>)> = Vec::new();

        for route in router.routes() {
            if route.is_resource() {
                if *req.method == Method::GET && route.resource_sub_path(path).is_some() {
                    push_variant(&mut resources, route.compiled().signature(), route);
                }
                continue;
            }
            let Some(class) = class_of(route, req.method) else {
                continue;
            };
            if route.matches_path(path) {
                push_variant(&mut regular, (class, route.compiled().signature()), route);
            }
        }

        // stable sorts: registration order survives within equal keys
        resources.sort_by_key(|(prefix, _)| Reverse(prefix.len()));
        regular.sort_by_key(|((class, _), _)| *class);

        resources
            .iter()
            .map(|(_, group)| group)
            .chain(regular.iter().map(|(_, group)| group))
            .find_map(|group| pick(group.iter().copied(), req.languages))
    }
}

impl Resolver for LinearResolver {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn find<'r>(
        &self,
        req: &RequestDescriptor<'_>,
        routers: &'r [Arc<Router>],
    ) -> Option<Candidate<'r>> {
        routers.iter().find_map(|router| {
            let path = router.strip_prefix(req.path)?;
            Self::scan(router, path, req).map(|route| Candidate { router, route })
        })
    }
}
