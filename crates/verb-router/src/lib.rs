//! # Verb Router
//!
//! Request routing for Verb servers. Two routers share one dispatch contract:
//! - [`Router`]: routes registered in code (`/users/:id`, `/files/*rest`)
//! - [`FilesystemRouter`]: routes discovered from a directory tree
//!   (`routes/users/[id]/index.ts` → `/users/:id`), with hot reload
//!
//! [`UniversalRouter`] picks one of them from configuration and
//! [`RouterService`] mounts it on an axum server.
//!
//! ## Matching
//!
//! Both routers match through the same segment tree. At every level a literal
//! segment beats a `:param`, which beats a `*wildcard`, so the most specific
//! route wins regardless of registration order. A path that matches a route
//! but not its method gets a 405 with an `Allow` header; anything else
//! unmatched gets a 404.
//!
//! ## Dispatch
//!
//! Global middleware runs first, in registration order, then route-scoped
//! middleware, then the handler. Handler errors and panics become a 500 and
//! are logged with `tracing`; the error text only reaches the client in
//! development mode.
//!
//! ## Example
//!
//! ```
//! use axum::extract::Request;
//! use axum::http::Method;
//! use axum::response::IntoResponse;
//! use verb_router::{HandlerResult, RequestExt, Router};
//!
//! async fn show_user(req: Request) -> HandlerResult {
//!     let id = req.param("id").unwrap_or_default().to_string();
//!     Ok(id.into_response())
//! }
//!
//! let mut router = Router::new();
//! router.get("/users/:id", show_user).unwrap();
//!
//! let route = router.find_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(route.pattern.as_str(), "/users/:id");
//! assert_eq!(route.params.get("id"), Some("123"));
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
mod dispatch;
pub mod error;
pub mod facade;
pub mod fs;
pub mod handler;
pub mod middleware;
pub mod path;
pub mod response;
pub mod route;
pub mod router;
pub mod service;
pub mod tree;

pub use config::{Config, DevConfig, FilesystemOptions, RouterConfig, ServerConfig};
pub use error::{MatchError, Result, RouterError};
pub use facade::{RouteMatch, RouterKind, UniversalRouter};
pub use fs::{
    ChangeKind, FileMatch, FileRoute, FilesystemRouter, ModuleLoader, ModuleRegistry, Reloadable,
    RouteChange, RouteModule, RouteWatcher,
};
pub use handler::{BoxHandler, Handler, HandlerResult, Params, RequestExt};
pub use middleware::{BoxMiddleware, Chain, Middleware, Next};
pub use response::ErrorResponse;
pub use route::{ParameterSyntax, Pattern, Segment};
pub use router::{ResolvedRoute, Router};
pub use service::RouterService;
