//! Integration tests for the router facade and its tower service
//!
//! Requests go through `axum::Router::fallback_service`, the same way the
//! server mounts the router.

use std::fs;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use pretty_assertions::assert_eq;
use tower::ServiceExt;
use verb_router::{
    Config, FilesystemOptions, HandlerResult, ModuleRegistry, Next, RequestExt, RouteModule,
    RouterConfig, RouterError, RouterKind, RouterService, UniversalRouter,
};

async fn greet(req: Request) -> HandlerResult {
    let name = req.param("name").unwrap_or("world").to_string();
    Ok(format!("hello {}", name).into_response())
}

fn registry() -> Arc<ModuleRegistry> {
    Arc::new(ModuleRegistry::new().with_file("greet/[name].rs", || RouteModule::new().get(greet)))
}

fn app(router: UniversalRouter) -> axum::Router {
    axum::Router::new().fallback_service(RouterService::new(Arc::new(router)))
}

async fn call(app: axum::Router, method: Method, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_manual_router_behind_axum() {
    let mut router = UniversalRouter::manual();
    router.add_route(Method::GET, "/greet/:name", greet).unwrap();
    router.add_middleware(|req: Request, next: Next| async move {
        let mut res = next.run(req).await?;
        res.headers_mut().insert("x-router", "manual".parse()?);
        Ok::<_, anyhow::Error>(res)
    });

    let app = app(router);
    assert_eq!(
        call(app.clone(), Method::GET, "/greet/ada").await,
        (StatusCode::OK, "hello ada".to_string())
    );
    assert_eq!(call(app.clone(), Method::POST, "/greet/ada").await.0, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(call(app, Method::GET, "/nope").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filesystem_router_from_toml_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("greet")).unwrap();
    fs::write(dir.path().join("greet/[name].rs"), "").unwrap();

    let toml = format!(
        r#"
        [router]
        type = "filesystem"
        root_directory = "{}"
        file_extensions = ["rs"]
        "#,
        dir.path().display()
    );
    let config: Config = toml::from_str(&toml).unwrap();

    let router = UniversalRouter::from_config(&config.router, registry()).unwrap();
    assert_eq!(router.kind(), RouterKind::Filesystem);

    let route = router.find_route(&Method::GET, "/greet/grace").unwrap();
    assert_eq!(route.pattern, "/greet/:name");
    assert_eq!(route.params.get("name"), Some("grace"));

    assert_eq!(
        call(app(router), Method::GET, "/greet/grace").await,
        (StatusCode::OK, "hello grace".to_string())
    );
}

#[test]
fn test_router_kind_selection() {
    let router = UniversalRouter::from_kind("manual", None, registry()).unwrap();
    assert_eq!(router.kind(), RouterKind::Manual);

    let err = UniversalRouter::from_kind("static", None, registry()).err().unwrap();
    assert!(matches!(err, RouterError::Configuration(_)));

    let dir = tempfile::tempdir().unwrap();
    let router = UniversalRouter::from_kind(
        "filesystem",
        Some(FilesystemOptions::new(dir.path())),
        registry(),
    )
    .unwrap();
    assert_eq!(router.kind(), RouterKind::Filesystem);
    assert!(router.routes().unwrap().is_empty());
}

#[test]
fn test_default_config_selects_manual_router() {
    let config = Config::default();
    assert_eq!(config.router, RouterConfig::Manual);
    let router = UniversalRouter::from_config(&config.router, registry()).unwrap();
    assert!(router.as_manual().is_some());
}
