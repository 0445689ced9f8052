mod common;

use common::handlers::noop;
use http::Method;
use regex::Regex;
use routeweave::error::RouteError;
use routeweave::resolver::{LinearResolver, RequestDescriptor, Resolver, SubsetResolver};
use routeweave::route::{Route, RouteMethod, RouteOptions};
use routeweave::router::{RouteRegistry, Router};

fn resolve_name(registry: &RouteRegistry, method: Method, url: &str) -> Option<String> {
    let none: Vec<String> = Vec::new();
    let req = RequestDescriptor::new(&method, url, &none);
    let linear = LinearResolver.resolve(&req, registry.routers());
    let subset = SubsetResolver.resolve(&req, registry.routers());
    assert_eq!(
        linear.as_ref().map(|r| r.route.id()),
        subset.as_ref().map(|r| r.route.id())
    );
    subset.and_then(|r| r.route.name().map(str::to_string))
}

#[test]
fn test_conflicting_slot_is_rejected() {
    let mut registry = RouteRegistry::new();
    let mut router = registry.default_router().unwrap();
    router
        .get("/a/:x", noop(), RouteOptions::new().language("en"))
        .unwrap();
    // same signature, different parameter name
    let err = router
        .get("/a/:y", noop(), RouteOptions::new().language("EN"))
        .unwrap_err();
    assert!(matches!(err, RouteError::Conflict { .. }));
    // another language is a different slot
    router
        .get("/a/:y", noop(), RouteOptions::new().language("de"))
        .unwrap();
}

#[test]
fn test_configuration_errors() {
    let mut registry = RouteRegistry::new();
    let mut router = registry.default_router().unwrap();
    assert!(matches!(
        router.add_route("BREW", "/coffee", noop(), RouteOptions::new()),
        Err(RouteError::InvalidMethod(_))
    ));
    assert!(matches!(
        router.get("coffee", noop(), RouteOptions::new()),
        Err(RouteError::InvalidPath { .. })
    ));
    assert!(matches!(
        router.get("/:id/:id", noop(), RouteOptions::new()),
        Err(RouteError::DuplicateParam { .. })
    ));
    assert!(matches!(
        router.get("/:id", noop(), RouteOptions::new().filter("id", "@nope")),
        Err(RouteError::UnknownFilterKeyword(_))
    ));
    assert!(registry.routes().is_empty());
}

#[test]
fn test_update_route_reindexes() {
    let mut registry = RouteRegistry::new();
    let id = registry
        .default_router()
        .unwrap()
        .get("/old", noop(), RouteOptions::new().name("page"))
        .unwrap();
    registry
        .default_router()
        .unwrap()
        .get("/taken", noop(), RouteOptions::new())
        .unwrap();

    registry
        .default_router()
        .unwrap()
        .update_route(id, |route| {
            route.set_path("/new/:slug")?;
            route.set_filter("slug", "@slug")
        })
        .unwrap();
    assert_eq!(resolve_name(&registry, Method::GET, "/old"), None);
    assert_eq!(
        resolve_name(&registry, Method::GET, "/new/hello-world"),
        Some("page".to_string())
    );
    assert_eq!(resolve_name(&registry, Method::GET, "/new/Hello"), None);

    // moving onto an occupied slot rolls back
    let err = registry
        .default_router()
        .unwrap()
        .update_route(id, |route| route.set_path("/taken"))
        .unwrap_err();
    assert!(matches!(err, RouteError::Conflict { .. }));
    assert_eq!(
        resolve_name(&registry, Method::GET, "/new/abc"),
        Some("page".to_string())
    );
}

#[test]
fn test_raw_regex_route() {
    let mut registry = RouteRegistry::new();
    let pattern = Regex::new(r"^/v(?P<major>[0-9]+)/status$").unwrap();
    registry
        .default_router()
        .unwrap()
        .get(pattern, noop(), RouteOptions::new().name("status"))
        .unwrap();

    let none: Vec<String> = Vec::new();
    let method = Method::GET;
    let req = RequestDescriptor::new(&method, "/v2/status", &none);
    let found = SubsetResolver.resolve(&req, registry.routers()).unwrap();
    assert_eq!(found.route.name(), Some("status"));
    assert_eq!(found.params.get("major").map(String::as_str), Some("2"));
}

#[test]
fn test_insert_prebuilt_route_into_router() {
    let mut router = Router::new("shop", "/shop/").unwrap();
    assert_eq!(router.prefix(), "/shop");
    let search = Method::from_bytes(b"SEARCH").unwrap();
    assert_eq!(
        "search".parse::<RouteMethod>().unwrap(),
        RouteMethod::Only(search.clone())
    );
    let route = Route::new(
        RouteMethod::Only(search.clone()),
        "/products",
        noop(),
        RouteOptions::new().name("search"),
    )
    .unwrap();
    router.insert(route).unwrap();

    let mut registry = RouteRegistry::new();
    registry.add_router(router).unwrap();
    assert_eq!(
        resolve_name(&registry, search, "/shop/products"),
        Some("search".to_string())
    );
    assert_eq!(resolve_name(&registry, Method::GET, "/shop/products"), None);
}

#[test]
fn test_index_stats() {
    let mut router = Router::root("main");
    router.get("/a", noop(), RouteOptions::new()).unwrap();
    router.get("/b/:x", noop(), RouteOptions::new()).unwrap();
    router.any("/c", noop(), RouteOptions::new()).unwrap();
    router
        .resource("/static", "/srv", RouteOptions::new())
        .unwrap();
    let stats = router.storage().index_stats();
    assert_eq!(stats.routes, 4);
    assert_eq!(stats.resource_prefixes, 1);
    assert_eq!(stats.method_buckets, 2);
    assert_eq!(stats.literal_keys, 2);
    assert_eq!(stats.pattern_keys, 1);
}
