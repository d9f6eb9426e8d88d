//! Integration tests for the programmatic router
//!
//! Organized by feature area:
//! - Matching (literal, parameter, wildcard, specificity)
//! - Method handling (404, 405, HEAD)
//! - Middleware ordering and short-circuiting
//! - Failure handling (errors, panics, development mode)

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use pretty_assertions::assert_eq;
use rstest::rstest;
use verb_router::*;

async fn ok(_req: Request) -> HandlerResult {
    Ok(StatusCode::OK.into_response())
}

async fn echo_params(req: Request) -> HandlerResult {
    let rendered = req
        .params()
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&")
        })
        .unwrap_or_default();
    Ok(rendered.into_response())
}

async fn failing(_req: Request) -> HandlerResult {
    Err(anyhow::anyhow!("connection refused by db-primary"))
}

async fn panicking(_req: Request) -> HandlerResult {
    panic!("index out of bounds")
}

fn request(method: Method, uri: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_text(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// Matching
// ============================================================================

#[rstest]
#[case("/")]
#[case("/about")]
#[case("/blog/posts/archive")]
fn test_literal_routes_bind_nothing(#[case] path: &str) {
    let mut router = Router::new();
    router.get(path, ok).unwrap();

    let route = router.find_route(&Method::GET, path).unwrap();
    assert_eq!(route.pattern.as_str(), path);
    assert!(route.params.is_empty());
}

#[rstest]
#[case("/users/42", "42")]
#[case("/users/alice", "alice")]
#[case("/users/with%20space", "with%20space")]
fn test_param_binds_segment_text(#[case] path: &str, #[case] expected: &str) {
    let mut router = Router::new();
    router.get("/users/:id", ok).unwrap();

    let route = router.find_route(&Method::GET, path).unwrap();
    assert_eq!(route.params.get("id"), Some(expected));
}

#[test]
fn test_param_does_not_match_empty_segment() {
    let mut router = Router::new();
    router.get("/users/:id", ok).unwrap();
    assert_eq!(
        router.find_route(&Method::GET, "/users/").unwrap_err(),
        MatchError::NotFound
    );
}

#[test]
fn test_literal_beats_param_regardless_of_order() {
    let mut first = Router::new();
    first.get("/users/:id", ok).unwrap();
    first.get("/users/me", ok).unwrap();

    let mut second = Router::new();
    second.get("/users/me", ok).unwrap();
    second.get("/users/:id", ok).unwrap();

    for router in [&first, &second] {
        let route = router.find_route(&Method::GET, "/users/me").unwrap();
        assert_eq!(route.pattern.as_str(), "/users/me");
        assert!(route.params.is_empty());
    }
}

#[test]
fn test_wildcard_binds_remainder() {
    let mut router = Router::new();
    router.get("/files/*rest", ok).unwrap();

    let route = router.find_route(&Method::GET, "/files/a/b/c").unwrap();
    assert_eq!(route.params.get("rest"), Some("a/b/c"));
}

#[test]
fn test_anonymous_wildcard_binds_star() {
    let mut router = Router::new();
    router.get("/static/*", ok).unwrap();

    let route = router.find_route(&Method::GET, "/static/css/site.css").unwrap();
    assert_eq!(route.params.get("*"), Some("css/site.css"));
}

#[test]
fn test_non_terminal_wildcard_is_a_conflict() {
    let mut router = Router::new();
    let err = router.get("/files/*rest/edit", ok).err().unwrap();
    assert!(matches!(err, RouterError::Conflict { .. }));
}

#[tokio::test]
async fn test_params_reach_handler() {
    let mut router = Router::new();
    router.get("/orgs/:org/repos/:repo", echo_params).unwrap();

    let res = router
        .handle_request(request(Method::GET, "/orgs/verb/repos/router"))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "org=verb&repo=router");
}

#[tokio::test]
async fn test_trailing_slash_is_normalized() {
    let mut router = Router::new();
    router.get("/about", ok).unwrap();

    let res = router.handle_request(request(Method::GET, "/about/")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

// ============================================================================
// Methods
// ============================================================================

#[tokio::test]
async fn test_unregistered_method_is_405_with_allow() {
    let mut router = Router::new();
    router.get("/items", ok).unwrap();
    router.post("/items", ok).unwrap();

    let res = router.handle_request(request(Method::DELETE, "/items")).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()[header::ALLOW], "GET, POST, HEAD");
}

#[tokio::test]
async fn test_unregistered_path_is_404() {
    let mut router = Router::new();
    router.get("/items", ok).unwrap();

    let res = router.handle_request(request(Method::GET, "/nothing")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(res).await, r#"{"error":"Not Found"}"#);
}

#[tokio::test]
async fn test_most_specific_route_owns_the_method_check() {
    let mut router = Router::new();
    router.get("/users/me", ok).unwrap();
    router.post("/users/:id", ok).unwrap();

    for method in [Method::PUT, Method::POST] {
        let res = router.handle_request(request(method, "/users/me")).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "GET, HEAD");
    }

    let res = router.handle_request(request(Method::POST, "/users/42")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        router.find_route(&Method::POST, "/users/me").unwrap_err(),
        MatchError::MethodNotAllowed {
            allowed: vec![Method::GET, Method::HEAD]
        }
    );
}

#[tokio::test]
async fn test_add_route_twice_is_idempotent() {
    let mut router = Router::new();
    router.get("/ping", ok).unwrap();
    router.get("/ping", ok).unwrap();

    assert_eq!(router.routes(), vec![(Method::GET, "/ping".to_string())]);
    let res = router.handle_request(request(Method::GET, "/ping")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

// ============================================================================
// Middleware
// ============================================================================

type Trace = Arc<Mutex<Vec<String>>>;

fn tracing_layer(trace: &Trace, name: &'static str) -> BoxMiddleware {
    let trace = Arc::clone(trace);
    Arc::new(move |req: Request, next: Next| {
        let trace = Arc::clone(&trace);
        async move {
            trace.lock().unwrap().push(format!("{}:in", name));
            let res = next.run(req).await;
            trace.lock().unwrap().push(format!("{}:out", name));
            res
        }
    })
}

#[tokio::test]
async fn test_global_then_route_middleware_order() {
    let trace: Trace = Arc::default();
    let mut router = Router::new();

    let a = tracing_layer(&trace, "A");
    let b = tracing_layer(&trace, "B");
    router.add_middleware(move |req: Request, next: Next| a.handle(req, next));
    router.add_middleware(move |req: Request, next: Next| b.handle(req, next));

    let handler_trace = Arc::clone(&trace);
    router
        .route_with_middleware(
            Method::GET,
            "/ordered",
            vec![tracing_layer(&trace, "C")],
            move |_req: Request| {
                let trace = Arc::clone(&handler_trace);
                async move {
                    trace.lock().unwrap().push("handler".to_string());
                    Ok::<_, anyhow::Error>(StatusCode::OK.into_response())
                }
            },
        )
        .unwrap();

    let res = router.handle_request(request(Method::GET, "/ordered")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        *trace.lock().unwrap(),
        vec!["A:in", "B:in", "C:in", "handler", "C:out", "B:out", "A:out"]
    );
}

#[tokio::test]
async fn test_middleware_short_circuits() {
    let mut router = Router::new();
    router.add_middleware(|req: Request, next: Next| async move {
        if req.headers().contains_key(header::AUTHORIZATION) {
            next.run(req).await
        } else {
            Ok(StatusCode::UNAUTHORIZED.into_response())
        }
    });
    router.get("/secret", ok).unwrap();

    let res = router.handle_request(request(Method::GET, "/secret")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let authorized = Request::builder()
        .uri("/secret")
        .header(header::AUTHORIZATION, "Bearer token")
        .body(Body::empty())
        .unwrap();
    assert_eq!(router.handle_request(authorized).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_middleware_does_not_run_on_404() {
    let hits = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&hits);
    let mut router = Router::new();
    router.add_middleware(move |req: Request, next: Next| {
        *counter.lock().unwrap() += 1;
        next.run(req)
    });

    let res = router.handle_request(request(Method::GET, "/missing")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(*hits.lock().unwrap(), 0);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_handler_error_is_500_without_detail() {
    let mut router = Router::new();
    router.get("/fail", failing).unwrap();

    let res = router.handle_request(request(Method::GET, "/fail")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(res).await.contains("db-primary"));
}

#[tokio::test]
async fn test_handler_error_detail_in_development() {
    let mut router = Router::new().with_development(true);
    router.get("/fail", failing).unwrap();

    let res = router.handle_request(request(Method::GET, "/fail")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(res).await.contains("db-primary"));
}

#[tokio::test]
async fn test_panic_is_500_and_router_keeps_serving() {
    let mut router = Router::new();
    router.get("/panic", panicking).unwrap();
    router.get("/ok", ok).unwrap();

    let res = router.handle_request(request(Method::GET, "/panic")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let res = router.handle_request(request(Method::GET, "/ok")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_middleware_error_is_500() {
    let mut router = Router::new();
    router.add_middleware(|_req: Request, _next: Next| async move {
        Err::<Response, _>(anyhow::anyhow!("rate limiter unavailable"))
    });
    router.get("/", ok).unwrap();

    let res = router.handle_request(request(Method::GET, "/")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
