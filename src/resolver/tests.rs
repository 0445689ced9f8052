use super::*;
use crate::handler::{handler_fn, Handler};
use crate::route::RouteOptions;
use crate::router::{RouteRegistry, Router};
use serde_json::Value;

fn noop() -> Arc<dyn Handler> {
    handler_fn(|_| async { Ok(Value::Null) })
}

fn resolvers() -> [Arc<dyn Resolver>; 2] {
    [Arc::new(LinearResolver), Arc::new(SubsetResolver)]
}

fn langs(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

/// Resolve with both algorithms, assert they agree, return the shared result.
fn resolve_both(
    registry: &RouteRegistry,
    method: Method,
    url: &str,
    languages: &[&str],
) -> Option<Resolution> {
    let languages = langs(languages);
    let req = RequestDescriptor::new(&method, url, &languages);
    let [linear, subset] = resolvers();
    let a = linear.resolve(&req, registry.routers());
    let b = subset.resolve(&req, registry.routers());
    assert_eq!(
        a.as_ref().map(|r| r.route.id()),
        b.as_ref().map(|r| r.route.id()),
        "algorithms disagree on {method} {url}"
    );
    if let (Some(a), Some(b)) = (&a, &b) {
        assert_eq!(a.params, b.params);
        assert_eq!(a.resource_path, b.resource_path);
    }
    a
}

fn named(resolution: &Option<Resolution>) -> Option<&str> {
    resolution.as_ref().and_then(|r| r.route.name())
}

#[test]
fn test_literal_route_has_no_params() {
    let mut registry = RouteRegistry::new();
    registry
        .default_router()
        .unwrap()
        .get("/about", noop(), RouteOptions::new().name("about"))
        .unwrap();

    let found = resolve_both(&registry, Method::GET, "/about/?ref=nav", &[]).unwrap();
    assert_eq!(found.route.name(), Some("about"));
    assert!(found.params.is_empty());
    assert!(resolve_both(&registry, Method::GET, "/about/us", &[]).is_none());
}

#[test]
fn test_required_and_optional_params() {
    let mut registry = RouteRegistry::new();
    registry
        .default_router()
        .unwrap()
        .get("/items/:id/?:page", noop(), RouteOptions::new().name("items"))
        .unwrap();

    let full = resolve_both(&registry, Method::GET, "/items/42/3", &[]).unwrap();
    assert_eq!(full.params.get("id").map(String::as_str), Some("42"));
    assert_eq!(full.params.get("page").map(String::as_str), Some("3"));

    let short = resolve_both(&registry, Method::GET, "/items/42", &[]).unwrap();
    assert_eq!(short.params.get("id").map(String::as_str), Some("42"));
    assert!(!short.params.contains_key("page"));

    assert!(resolve_both(&registry, Method::GET, "/items", &[]).is_none());
}

#[test]
fn test_number_filter_rejects_words() {
    let mut registry = RouteRegistry::new();
    registry
        .default_router()
        .unwrap()
        .get(
            "/users/:id",
            noop(),
            RouteOptions::new().name("user").filter("id", "@number"),
        )
        .unwrap();

    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/users/17", &[])),
        Some("user")
    );
    assert!(resolve_both(&registry, Method::GET, "/users/abc", &[]).is_none());
}

#[test]
fn test_language_variants() {
    let mut registry = RouteRegistry::new();
    {
        let mut router = registry.default_router().unwrap();
        router
            .get("/home", noop(), RouteOptions::new().name("home.de").language("de"))
            .unwrap();
        router
            .get("/home", noop(), RouteOptions::new().name("home.en").language("en"))
            .unwrap();
        router
            .get("/home", noop(), RouteOptions::new().name("home"))
            .unwrap();
    }

    let en = resolve_both(&registry, Method::GET, "/home", &["fr", "en"]).unwrap();
    assert_eq!(en.route.name(), Some("home.en"));
    assert_eq!(en.language.as_deref(), Some("en"));

    let de = resolve_both(&registry, Method::GET, "/home", &["de-AT"]).unwrap();
    assert_eq!(de.route.name(), Some("home.de"));

    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/home", &["fr"])),
        Some("home")
    );
    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/home", &[])),
        Some("home")
    );
}

#[test]
fn test_unmet_language_falls_through_to_next_key() {
    let mut registry = RouteRegistry::new();
    {
        let mut router = registry.default_router().unwrap();
        router
            .get("/docs", noop(), RouteOptions::new().name("docs.fr").language("fr"))
            .unwrap();
        router
            .any("/:page", noop(), RouteOptions::new().name("catch"))
            .unwrap();
    }

    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/docs", &["en"])),
        Some("catch")
    );
    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/docs", &["fr"])),
        Some("docs.fr")
    );
}

#[test]
fn test_method_specific_beats_wildcard() {
    let mut registry = RouteRegistry::new();
    {
        let mut router = registry.default_router().unwrap();
        router
            .any("/things", noop(), RouteOptions::new().name("any"))
            .unwrap();
        router
            .post("/things", noop(), RouteOptions::new().name("create"))
            .unwrap();
        router
            .any("/things/:id", noop(), RouteOptions::new().name("any.one"))
            .unwrap();
        router
            .put("/things/:id", noop(), RouteOptions::new().name("update"))
            .unwrap();
    }

    assert_eq!(
        named(&resolve_both(&registry, Method::POST, "/things", &[])),
        Some("create")
    );
    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/things", &[])),
        Some("any")
    );
    assert_eq!(
        named(&resolve_both(&registry, Method::PUT, "/things/9", &[])),
        Some("update")
    );
    assert_eq!(
        named(&resolve_both(&registry, Method::DELETE, "/things/9", &[])),
        Some("any.one")
    );
}

#[test]
fn test_literal_beats_earlier_pattern() {
    let mut registry = RouteRegistry::new();
    {
        let mut router = registry.default_router().unwrap();
        router
            .get("/posts/:slug", noop(), RouteOptions::new().name("post"))
            .unwrap();
        router
            .get("/posts/latest", noop(), RouteOptions::new().name("latest"))
            .unwrap();
    }
    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/posts/latest", &[])),
        Some("latest")
    );
    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/posts/hello", &[])),
        Some("post")
    );
}

#[test]
fn test_patterns_in_registration_order() {
    let mut registry = RouteRegistry::new();
    {
        let mut router = registry.default_router().unwrap();
        router
            .get("/:a", noop(), RouteOptions::new().name("first"))
            .unwrap();
        router
            .get("/:b/?:c", noop(), RouteOptions::new().name("second"))
            .unwrap();
    }
    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/x", &[])),
        Some("first")
    );
}

#[test]
fn test_router_order_and_prefix() {
    let mut registry = RouteRegistry::new();
    registry
        .add_router(Router::new("api", "/api").unwrap())
        .unwrap();
    registry
        .add_router(Router::new("fallback", "").unwrap())
        .unwrap();
    registry
        .router("api")
        .unwrap()
        .get("/users", noop(), RouteOptions::new().name("api.users"))
        .unwrap();
    registry
        .router("fallback")
        .unwrap()
        .any("/api/users", noop(), RouteOptions::new().name("fallback.users"))
        .unwrap();
    registry
        .router("api")
        .unwrap()
        .get("/", noop(), RouteOptions::new().name("api.index"))
        .unwrap();

    let found = resolve_both(&registry, Method::GET, "/api/users", &[]).unwrap();
    assert_eq!(found.route.name(), Some("api.users"));
    assert_eq!(found.router.name(), "api");

    // api router has no POST route; the later router still gets its turn
    assert_eq!(
        named(&resolve_both(&registry, Method::POST, "/api/users", &[])),
        Some("fallback.users")
    );
    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/api", &[])),
        Some("api.index")
    );
    // prefix stops at a segment boundary
    assert!(resolve_both(&registry, Method::GET, "/apiusers", &[]).is_none());
}

#[test]
fn test_resource_prefix_priority_on_get() {
    let mut registry = RouteRegistry::new();
    {
        let mut router = registry.default_router().unwrap();
        router
            .get("/static/:file", noop(), RouteOptions::new().name("dynamic"))
            .unwrap();
        router
            .resource("/static", "/srv/static", RouteOptions::new().name("assets"))
            .unwrap();
        router
            .resource("/static/img", "/srv/img", RouteOptions::new().name("images"))
            .unwrap();
    }

    let found = resolve_both(&registry, Method::GET, "/static/app.js", &[]).unwrap();
    assert_eq!(found.route.name(), Some("assets"));
    assert!(found.is_resource());
    assert_eq!(found.resource_path.as_deref(), Some("app.js"));
    assert!(found.params.is_empty());

    let img = resolve_both(&registry, Method::GET, "/static/img/logo.png", &[]).unwrap();
    assert_eq!(img.route.name(), Some("images"));
    assert_eq!(img.resource_path.as_deref(), Some("logo.png"));

    // resources only serve GET
    assert_eq!(
        named(&resolve_both(&registry, Method::POST, "/static/app.js", &[])),
        None
    );
    assert!(resolve_both(&registry, Method::GET, "/staticfoo", &[]).is_none());
}

#[test]
fn test_agreement_after_mutations() {
    let mut registry = RouteRegistry::new();
    let ids: Vec<_> = {
        let mut router = registry.default_router().unwrap();
        (0..6)
            .map(|i| {
                router
                    .get(format!("/p{i}/:x").as_str(), noop(), RouteOptions::new())
                    .unwrap()
            })
            .collect()
    };
    {
        let mut router = registry.default_router().unwrap();
        router
            .get("/:any/:x", noop(), RouteOptions::new().name("generic"))
            .unwrap();
        router.remove_route(ids[1]).unwrap();
        router
            .update_route(ids[3], |route| route.set_path("/moved/:x"))
            .unwrap();
    }

    // removed route falls through to the generic pattern
    assert_eq!(
        named(&resolve_both(&registry, Method::GET, "/p1/a", &[])),
        Some("generic")
    );
    // the updated route keeps its registration position ahead of `generic`
    let moved = resolve_both(&registry, Method::GET, "/moved/a", &[]).unwrap();
    assert_eq!(moved.route.id(), ids[3]);
    assert_eq!(moved.params.get("x").map(String::as_str), Some("a"));
    for i in [0, 2, 4, 5] {
        let url = format!("/p{i}/z");
        let found = resolve_both(&registry, Method::GET, &url, &[]).unwrap();
        assert_eq!(found.route.id(), ids[i]);
    }
}

#[test]
fn test_allowed_methods() {
    let mut registry = RouteRegistry::new();
    {
        let mut router = registry.default_router().unwrap();
        router.post("/orders", noop(), RouteOptions::new()).unwrap();
        router.delete("/orders/:id", noop(), RouteOptions::new()).unwrap();
        router.get("/orders/:id", noop(), RouteOptions::new()).unwrap();
    }
    let none: Vec<String> = Vec::new();
    let method = Method::PATCH;
    let req = RequestDescriptor::new(&method, "/orders/5", &none);
    assert_eq!(
        allowed_methods(&req, registry.routers()),
        vec![Method::GET, Method::DELETE]
    );
    let req = RequestDescriptor::new(&method, "/nothing", &none);
    assert!(allowed_methods(&req, registry.routers()).is_empty());

    // the request's own method is never offered back
    let get = Method::GET;
    let req = RequestDescriptor::new(&get, "/orders/5", &none);
    assert_eq!(allowed_methods(&req, registry.routers()), vec![Method::DELETE]);
    let post = Method::POST;
    let req = RequestDescriptor::new(&post, "/orders", &none);
    assert!(allowed_methods(&req, registry.routers()).is_empty());
}

#[test]
fn test_language_miss_lists_no_methods() {
    let mut registry = RouteRegistry::new();
    registry
        .default_router()
        .unwrap()
        .get("/about", noop(), RouteOptions::new().language("en"))
        .unwrap();
    assert!(resolve_both(&registry, Method::GET, "/about", &["fr"]).is_none());
    let method = Method::GET;
    let french = langs(&["fr"]);
    let req = RequestDescriptor::new(&method, "/about", &french);
    assert!(allowed_methods(&req, registry.routers()).is_empty());
}

#[test]
fn test_request_descriptor_strips_query_and_slash() {
    let method = Method::GET;
    let none: Vec<String> = Vec::new();
    let req = RequestDescriptor::new(&method, "/a/b/?x=1", &none);
    assert_eq!(req.path, "/a/b");
    let req = RequestDescriptor::new(&method, "/?x=1", &none);
    assert_eq!(req.path, "/");
}
