// Demo handlers served by both router kinds: registered in code for the
// manual router, and as route modules for the filesystem router.

use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::debug;
use verb_router::{HandlerResult, ModuleRegistry, Next, RequestExt, RouteModule, Router};

pub async fn index(_req: Request) -> HandlerResult {
    Ok(Json(json!({
        "name": "verb",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response())
}

pub async fn health(_req: Request) -> HandlerResult {
    Ok(Json(json!({ "status": "ok" })).into_response())
}

pub async fn show_user(req: Request) -> HandlerResult {
    let id = req.param("id").unwrap_or_default();
    Ok(Json(json!({ "id": id })).into_response())
}

pub async fn delete_user(_req: Request) -> HandlerResult {
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn show_file(req: Request) -> HandlerResult {
    let path = req.param("path").unwrap_or_default();
    Ok(Json(json!({ "path": path })).into_response())
}

/// Logs how long each matched request took.
pub async fn timing(req: Request, next: Next) -> HandlerResult {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;
    debug!("{} {} handled in {:?}", method, path, started.elapsed());
    res
}

/// Routes for the manual router.
pub fn register(router: &mut Router) -> verb_router::Result<()> {
    router
        .get("/", index)?
        .get("/health", health)?
        .get("/users/:id", show_user)?
        .delete("/users/:id", delete_user)?
        .get("/files/*path", show_file)?;
    Ok(())
}

/// Route modules for the filesystem router, keyed by the pattern their file
/// maps to (e.g. `routes/users/[id].ts` → `/users/:id`).
pub fn registry() -> ModuleRegistry {
    ModuleRegistry::new()
        .with_pattern("/", || RouteModule::new().get(index))
        .with_pattern("/health", || RouteModule::new().get(health))
        .with_pattern("/users/:id", || {
            RouteModule::new().get(show_user).delete(delete_user)
        })
        .with_pattern("/files/*path", || RouteModule::new().get(show_file))
}
