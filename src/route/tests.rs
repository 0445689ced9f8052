use super::*;
use crate::error::RouteError;
use crate::handler::{handler_fn, Handler};
use http::Method;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

fn noop() -> Arc<dyn Handler> {
    handler_fn(|_| async { Ok(Value::Null) })
}

fn get(path: &str, options: RouteOptions) -> Route {
    Route::new(RouteMethod::Only(Method::GET), path, noop(), options).unwrap()
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_literal_path_has_no_regex() {
    let compiled = compile("/about/team/", &BTreeMap::new()).unwrap();
    assert!(compiled.is_literal());
    assert_eq!(compiled.signature(), "/about/team");
    assert!(compiled.is_match("/about/team"));
    assert_eq!(compiled.captures("/about/team"), Some(HashMap::new()));
    assert!(compiled.captures("/about").is_none());
}

#[test]
fn test_root_path() {
    let compiled = compile("/", &BTreeMap::new()).unwrap();
    assert!(compiled.is_literal());
    assert!(compiled.is_match("/"));
    assert_eq!(normalize_path(""), "/");
    assert_eq!(normalize_path("/a//"), "/a");
}

#[test]
fn test_required_and_optional_params() {
    let route = get("/items/:id/?:page", RouteOptions::new());
    assert_eq!(route.required_params(), ["id"]);
    assert_eq!(route.optional_params(), ["page"]);

    let c = route.compiled();
    assert_eq!(c.captures("/items/42"), Some(params(&[("id", "42")])));
    assert_eq!(
        c.captures("/items/42/3"),
        Some(params(&[("id", "42"), ("page", "3")]))
    );
    assert!(c.captures("/items").is_none());
    assert!(c.captures("/items/").is_none());
}

#[test]
fn test_params_around_literal_segment() {
    let route = get("/items/:id/page/:page", RouteOptions::new());
    assert_eq!(
        route.compiled().captures("/items/42/page/3"),
        Some(params(&[("id", "42"), ("page", "3")]))
    );
    assert!(!route.matches_path("/items/42"));
}

#[test]
fn test_number_filter() {
    let route = get("/users/:id", RouteOptions::new().filter("id", "@number"));
    assert!(!route.matches_path("/users/abc"));
    assert_eq!(
        route.compiled().captures("/users/7"),
        Some(params(&[("id", "7")]))
    );
}

#[test]
fn test_filter_priority_forms() {
    let by_regex = get(
        "/c/:code",
        RouteOptions::new().filter("code", Regex::new("^[A-Z]{3}$").unwrap()),
    );
    assert!(by_regex.matches_path("/c/EUR"));
    assert!(!by_regex.matches_path("/c/eur"));

    let by_pattern = get("/c/:code", RouteOptions::new().filter("code", "[a-z]{2}"));
    assert!(by_pattern.matches_path("/c/en"));
    assert!(!by_pattern.matches_path("/c/eng"));

    let default = get("/c/:code", RouteOptions::new());
    assert!(default.matches_path("/c/v1.2_beta-3"));
    assert!(!default.matches_path("/c/a%20b c"));
}

#[test]
fn test_values_are_percent_decoded() {
    let route = get("/files/:name", RouteOptions::new().filter("name", "@any"));
    assert_eq!(
        route.compiled().captures("/files/my%20file.txt"),
        Some(params(&[("name", "my file.txt")]))
    );
}

#[test]
fn test_invalid_path_messages_name_the_reason() {
    let filters = BTreeMap::new();
    let unrooted = compile("users", &filters).unwrap_err().to_string();
    assert!(unrooted.contains("start with `/`"), "{unrooted}");
    let empty_segment = compile("/a//b", &filters).unwrap_err().to_string();
    assert_eq!(empty_segment, "invalid path `/a//b`: empty segment");
    let resource = Route::resource("/files/:id", "/srv", RouteOptions::new())
        .unwrap_err()
        .to_string();
    assert!(resource.contains("cannot have parameters"), "{resource}");
}

#[test]
fn test_configuration_errors() {
    let filters = BTreeMap::new();
    assert!(matches!(compile("", &filters), Err(RouteError::InvalidPath { .. })));
    assert!(matches!(compile("users", &filters), Err(RouteError::InvalidPath { .. })));
    assert!(matches!(compile("/a//b", &filters), Err(RouteError::InvalidPath { .. })));
    assert!(matches!(compile("/a/:", &filters), Err(RouteError::EmptyParam(_))));
    assert!(matches!(compile("/a/?:", &filters), Err(RouteError::EmptyParam(_))));
    assert!(matches!(
        compile("/a/:id/b/:id", &filters),
        Err(RouteError::DuplicateParam { param, .. }) if param == "id"
    ));

    let mut bad = BTreeMap::new();
    bad.insert("id".to_string(), ParamFilter::from("@nope"));
    assert!(matches!(
        compile("/a/:id", &bad),
        Err(RouteError::UnknownFilterKeyword(_))
    ));
    bad.insert("id".to_string(), ParamFilter::from("[unclosed"));
    assert!(matches!(
        compile("/a/:id", &bad),
        Err(RouteError::InvalidPattern { .. })
    ));
}

#[test]
fn test_surrogates_are_fresh_after_recompile() {
    let mut route = get("/users/:id", RouteOptions::new());
    let before: Vec<String> = route.compiled().surrogates().keys().cloned().collect();
    let signature = route.compiled().signature().to_string();

    route.set_path("/users/:id").unwrap();
    let after: Vec<String> = route.compiled().surrogates().keys().cloned().collect();

    assert_eq!(before.len(), 1);
    assert_ne!(before, after);
    assert_eq!(route.compiled().signature(), signature);
    assert_eq!(route.compiled().param_name(&after[0]), "id");
}

#[test]
fn test_set_filter_rederives() {
    let mut route = get("/users/:id", RouteOptions::new());
    assert!(route.matches_path("/users/abc"));
    route.set_filter("id", "@number").unwrap();
    assert!(!route.matches_path("/users/abc"));
    assert!(route.matches_path("/users/12"));

    // a failing mutation leaves the route untouched
    assert!(route.set_filter("id", "@bogus").is_err());
    assert!(route.matches_path("/users/12"));
    assert!(route.set_path("no-slash").is_err());
    assert!(route.matches_path("/users/12"));
}

#[test]
fn test_path_key() {
    let literal = get("/about/", RouteOptions::new());
    assert_eq!(literal.path_key(), PathKey::Literal("/about".into()));

    let a = get("/users/:id", RouteOptions::new());
    let b = get("/users/:uid", RouteOptions::new());
    assert!(matches!(a.path_key(), PathKey::Pattern(_)));
    // same shape, different names: same key
    assert_eq!(a.path_key(), b.path_key());

    let c = get("/users/:id", RouteOptions::new().filter("id", "@number"));
    assert_ne!(a.path_key(), c.path_key());
}

#[test]
fn test_raw_regex_route() {
    let re = Regex::new(r"^/archive/(?P<year>\d{4})/(?P<month>\d{2})$").unwrap();
    let route = Route::new(RouteMethod::Any, re, noop(), RouteOptions::new()).unwrap();
    assert_eq!(route.required_params(), ["year", "month"]);
    assert_eq!(
        route.compiled().captures("/archive/2024/05"),
        Some(params(&[("year", "2024"), ("month", "05")]))
    );
}

#[test]
fn test_language_is_lowercased() {
    let mut route = get("/", RouteOptions::new().language("en-GB"));
    assert_eq!(route.language(), Some("en-gb"));
    route.set_language(None);
    assert_eq!(route.language(), None);
}

#[test]
fn test_resource_route() {
    let route = Route::resource("/static/", "/srv/www", RouteOptions::new()).unwrap();
    assert!(route.is_resource());
    assert!(route.handler().is_none());
    assert_eq!(route.method(), &RouteMethod::Only(Method::GET));
    assert_eq!(route.resource_sub_path("/static"), Some(String::new()));
    assert_eq!(
        route.resource_sub_path("/static/css/site.css"),
        Some("css/site.css".to_string())
    );
    assert_eq!(route.resource_sub_path("/staticfoo"), None);

    assert!(matches!(
        Route::resource("/files/:id", "/srv", RouteOptions::new()),
        Err(RouteError::InvalidPath { .. })
    ));
    let mut route = route;
    assert!(route.set_method(RouteMethod::Only(Method::POST)).is_err());
}

#[test]
fn test_method_parsing() {
    assert_eq!("get".parse::<RouteMethod>().unwrap(), RouteMethod::Only(Method::GET));
    assert_eq!("*".parse::<RouteMethod>().unwrap(), RouteMethod::Any);
    assert_eq!("any".parse::<RouteMethod>().unwrap(), RouteMethod::Any);
    assert!(matches!(
        "TRACE".parse::<RouteMethod>(),
        Err(RouteError::InvalidMethod(_))
    ));
    assert!(RouteMethod::Any.accepts(&Method::DELETE));
    assert!(!RouteMethod::Only(Method::GET).accepts(&Method::POST));
    assert_eq!(RouteMethod::Any.to_string(), "*");
}
