mod common;

use common::handlers::tagged;
use common::pipeline::dispatch;
use http::Method;
use routeweave::config::EngineConfig;
use routeweave::dispatcher::{Dispatcher, Outcome};
use routeweave::route::RouteOptions;
use routeweave::server::Request;
use routeweave::static_files::StaticFiles;
use std::fs;

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    fs::write(dir.path().join("css/app.css"), "body{}").unwrap();
    dir
}

#[tokio::test]
async fn test_resource_route_serves_file() {
    let dir = site();
    let dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher
        .resource("/assets", dir.path(), RouteOptions::new().name("assets"))
        .unwrap();

    let (outcome, res) = dispatch(&dispatcher, Request::new(Method::GET, "/assets/css/app.css")).await;
    match &outcome {
        Outcome::Served { path, resolution } => {
            assert!(path.ends_with("css/app.css"));
            assert_eq!(resolution.resource_path.as_deref(), Some("css/app.css"));
        }
        other => panic!("expected a served file, got {other:?}"),
    }
    assert_eq!(res.status, Some(200));
    assert_eq!(res.body_str(), Some("body{}"));
    assert_eq!(res.header("content-type"), Some("text/css"));
}

#[tokio::test]
async fn test_resource_wins_over_dynamic_route_on_get_only() {
    let dir = site();
    let dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher
        .get("/assets/:file", tagged("dynamic"), RouteOptions::new())
        .unwrap();
    dispatcher
        .post("/assets/:file", tagged("upload"), RouteOptions::new())
        .unwrap();
    dispatcher
        .resource("/assets", dir.path(), RouteOptions::new())
        .unwrap();

    let (get, _) = dispatch(&dispatcher, Request::new(Method::GET, "/assets/index.html")).await;
    assert!(matches!(get, Outcome::Served { .. }));

    let (post, _) = dispatch(&dispatcher, Request::new(Method::POST, "/assets/index.html")).await;
    assert_eq!(post.payload(), Some(&serde_json::json!("upload")));
}

#[tokio::test]
async fn test_missing_file_and_traversal_are_not_found() {
    let dir = site();
    let dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher
        .resource("/assets", dir.path(), RouteOptions::new())
        .unwrap();

    let (missing, res) = dispatch(&dispatcher, Request::new(Method::GET, "/assets/nope.js")).await;
    assert!(matches!(missing, Outcome::NotFound));
    assert!(res.served.is_none());

    let (escape, _) = dispatch(
        &dispatcher,
        Request::new(Method::GET, "/assets/../Cargo.toml"),
    )
    .await;
    assert!(matches!(escape, Outcome::NotFound));
}

#[tokio::test]
async fn test_static_files_resolve() {
    let dir = site();
    let files = StaticFiles::new(dir.path());
    assert!(files.resolve("index.html").await.is_some());
    assert!(files.resolve("css").await.is_none());
    assert!(files.map_path("../etc/passwd").is_none());
}
