//! Route modules and how they are loaded.
//!
//! A route file on disk names a route; the code that serves it is a
//! [`RouteModule`] produced by a [`ModuleLoader`]. The filesystem router asks
//! the loader for a module the first time a route is hit, and again whenever
//! the route's generation changes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::http::Method;

use super::scanner::{relative_key, FileRoute};
use crate::error::with_implicit_head;
use crate::handler::{BoxHandler, Handler};
use crate::middleware::{BoxMiddleware, Middleware};

/// What a loaded route file provides.
#[derive(Clone, Default)]
pub struct RouteModule {
    handlers: Vec<(Method, BoxHandler)>,
    fallback: Option<BoxHandler>,
    middleware: Vec<BoxMiddleware>,
}

impl RouteModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler for `method`, replacing any previous one.
    pub fn handler(mut self, method: Method, handler: impl Handler) -> Self {
        let handler: BoxHandler = Arc::new(handler);
        match self.handlers.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((method, handler)),
        }
        self
    }

    pub fn get(self, handler: impl Handler) -> Self {
        self.handler(Method::GET, handler)
    }

    pub fn post(self, handler: impl Handler) -> Self {
        self.handler(Method::POST, handler)
    }

    pub fn put(self, handler: impl Handler) -> Self {
        self.handler(Method::PUT, handler)
    }

    pub fn patch(self, handler: impl Handler) -> Self {
        self.handler(Method::PATCH, handler)
    }

    pub fn delete(self, handler: impl Handler) -> Self {
        self.handler(Method::DELETE, handler)
    }

    /// Serves every method without a dedicated handler.
    pub fn any(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Route-scoped middleware, run after the router's global middleware.
    pub fn with_middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Resolves the handler for `method`: exact match, then `GET` for `HEAD`,
    /// then the fallback.
    pub fn handler_for(&self, method: &Method) -> Option<&BoxHandler> {
        let exact = |wanted: &Method| {
            self.handlers
                .iter()
                .find(|(m, _)| m == wanted)
                .map(|(_, handler)| handler)
        };
        exact(method)
            .or_else(|| (*method == Method::HEAD).then(|| exact(&Method::GET)).flatten())
            .or(self.fallback.as_ref())
    }

    /// Methods with a dedicated handler, in registration order.
    pub fn methods(&self) -> Vec<Method> {
        self.handlers.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Methods to advertise in an `Allow` header: the dedicated handlers,
    /// plus `HEAD` when `GET` serves it.
    pub fn allowed(&self) -> Vec<Method> {
        with_implicit_head(self.methods())
    }

    pub fn middleware(&self) -> &[BoxMiddleware] {
        &self.middleware
    }
}

impl std::fmt::Debug for RouteModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteModule")
            .field("methods", &self.methods())
            .field("fallback", &self.fallback.is_some())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Produces the module for a discovered route.
#[async_trait]
pub trait ModuleLoader: Send + Sync + 'static {
    async fn load(&self, route: &FileRoute) -> Result<RouteModule>;
}

type ModuleFactory = Arc<dyn Fn() -> RouteModule + Send + Sync>;

/// A [`ModuleLoader`] backed by modules compiled into the binary.
///
/// Modules are registered either by route file (relative to the routes
/// directory, extension included) or by the pattern the file maps to. File
/// registrations take precedence.
///
/// ```
/// use axum::extract::Request;
/// use axum::response::IntoResponse;
/// use verb_router::{HandlerResult, ModuleRegistry, RouteModule};
///
/// async fn show(_req: Request) -> HandlerResult {
///     Ok("user".into_response())
/// }
///
/// let registry = ModuleRegistry::new()
///     .with_file("users/[id]/index.ts", || RouteModule::new().get(show))
///     .with_pattern("/health", || RouteModule::new().get(show));
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    by_file: HashMap<String, ModuleFactory>,
    by_pattern: HashMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file<F>(mut self, file: &str, factory: F) -> Self
    where
        F: Fn() -> RouteModule + Send + Sync + 'static,
    {
        self.by_file
            .insert(relative_key(Path::new(file)), Arc::new(factory));
        self
    }

    pub fn with_pattern<F>(mut self, pattern: &str, factory: F) -> Self
    where
        F: Fn() -> RouteModule + Send + Sync + 'static,
    {
        let key = crate::path::normalize_path(pattern).into_owned();
        self.by_pattern.insert(key, Arc::new(factory));
        self
    }

    pub fn len(&self) -> usize {
        self.by_file.len() + self.by_pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn factory(&self, route: &FileRoute) -> Option<&ModuleFactory> {
        self.by_file
            .get(&route.key())
            .or_else(|| self.by_pattern.get(route.pattern.as_str()))
    }
}

#[async_trait]
impl ModuleLoader for ModuleRegistry {
    async fn load(&self, route: &FileRoute) -> Result<RouteModule> {
        match self.factory(route) {
            Some(factory) => Ok(factory()),
            None => bail!(
                "no module registered for route file `{}` ({})",
                route.key(),
                route.pattern
            ),
        }
    }
}
