//! Programmatic router.
//!
//! Routes are registered in code with [`Router::add_route`] (or the
//! `get`/`post`/... helpers) and stored in a [`RadixNode`] keyed by segment.
//! Several methods can share a path; each `(method, pattern)` pair owns one
//! handler and its route-scoped middleware.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::dispatch::{self, Site};
use crate::error::{with_implicit_head, MatchError, Result};
use crate::handler::{BoxHandler, Handler, Params};
use crate::middleware::{BoxMiddleware, Chain, Middleware};
use crate::response::ErrorResponse;
use crate::route::Pattern;
use crate::tree::RadixNode;

/// One registered `(method, pattern)` pair.
#[derive(Clone)]
struct Endpoint {
    pattern: Pattern,
    handler: BoxHandler,
    middleware: Vec<BoxMiddleware>,
}

/// Everything registered on one terminal node, in registration order.
#[derive(Clone, Default)]
pub(crate) struct Endpoints {
    handlers: Vec<(Method, Endpoint)>,
}

impl Endpoints {
    /// Handler for `method`. `HEAD` is served by `GET` unless registered on
    /// its own.
    fn get(&self, method: &Method) -> Option<&Endpoint> {
        self.exact(method).or_else(|| {
            if *method == Method::HEAD {
                self.exact(&Method::GET)
            } else {
                None
            }
        })
    }

    fn exact(&self, method: &Method) -> Option<&Endpoint> {
        self.handlers
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, endpoint)| endpoint)
    }

    fn allowed(&self) -> Vec<Method> {
        with_implicit_head(self.handlers.iter().map(|(m, _)| m.clone()).collect())
    }

    /// Registers or replaces the endpoint for `method`. Returns `true` when an
    /// existing one was replaced.
    fn set(&mut self, method: Method, endpoint: Endpoint) -> bool {
        match self.handlers.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => {
                slot.1 = endpoint;
                true
            }
            None => {
                self.handlers.push((method, endpoint));
                false
            }
        }
    }
}

/// A resolved route, borrowed from the router.
pub struct ResolvedRoute<'r> {
    pub pattern: &'r Pattern,
    pub handler: &'r BoxHandler,
    /// Route-scoped middleware only; global middleware lives on the router.
    pub middleware: &'r [BoxMiddleware],
    pub params: Params,
}

impl std::fmt::Debug for ResolvedRoute<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedRoute")
            .field("pattern", self.pattern)
            .field("middleware", &self.middleware.len())
            .field("params", &self.params)
            .finish()
    }
}

/// The programmatic router.
#[derive(Clone, Default)]
pub struct Router {
    root: RadixNode<Endpoints>,
    middleware: Vec<BoxMiddleware>,
    development: bool,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// In development mode, 500 responses carry the error text.
    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn development(&self) -> bool {
        self.development
    }

    /// Registers `handler` for `method` on `pattern`.
    ///
    /// Registering the same `(method, pattern)` again replaces the previous
    /// handler. Parameter names are per registration, so `/users/:id` and
    /// `/users/:user_id` share a node but bind different names.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<&mut Self> {
        self.route_with_middleware(method, pattern, Vec::new(), handler)
    }

    /// Like [`add_route`](Self::add_route), with middleware that only runs for
    /// this route, after the global middleware.
    pub fn route_with_middleware(
        &mut self,
        method: Method,
        pattern: &str,
        middleware: Vec<BoxMiddleware>,
        handler: impl Handler,
    ) -> Result<&mut Self> {
        let pattern = Pattern::parse(pattern)?;
        let endpoint = Endpoint {
            pattern: pattern.clone(),
            handler: Arc::new(handler),
            middleware,
        };

        let replaced = self
            .root
            .insert_with(&pattern, Endpoints::default)
            .set(method.clone(), endpoint);
        if replaced {
            debug!("Replaced handler for {} {}", method, pattern);
        } else {
            debug!("Registered route {} {}", method, pattern);
        }
        Ok(self)
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self> {
        self.add_route(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self> {
        self.add_route(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self> {
        self.add_route(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self> {
        self.add_route(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self> {
        self.add_route(Method::DELETE, pattern, handler)
    }

    /// Appends to the global chain. Global middleware runs for every matched
    /// route, in registration order.
    pub fn add_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Resolves a request without running anything.
    ///
    /// The most specific route for `path` decides: its handler for `method`,
    /// or a 405 listing its methods. Less specific routes are never consulted.
    pub fn find_route(&self, method: &Method, path: &str) -> Result<ResolvedRoute<'_>, MatchError> {
        let found = self.root.lookup(path).ok_or(MatchError::NotFound)?;
        let Some(endpoint) = found.value.get(method) else {
            return Err(MatchError::MethodNotAllowed {
                allowed: found.value.allowed(),
            });
        };

        Ok(ResolvedRoute {
            pattern: &endpoint.pattern,
            handler: &endpoint.handler,
            middleware: &endpoint.middleware,
            params: Params::from_captures(&endpoint.pattern.param_names(), found.captures),
        })
    }

    /// Dispatches a request: match, bind parameters, run the chain.
    ///
    /// Never fails; lookup misses become 404/405 and handler failures 500.
    pub async fn handle_request(&self, mut req: Request) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let ResolvedRoute {
            pattern,
            handler,
            middleware,
            params,
        } = match self.find_route(&method, &path) {
            Ok(route) => route,
            Err(err) => {
                debug!("{} {} -> {}", method, path, err);
                return ErrorResponse::from(err).into_response();
            }
        };

        debug!("{} {} -> {}", method, path, pattern);
        req.extensions_mut().insert(params);

        let chain = Chain::new(Arc::clone(handler))
            .with_layers(&self.middleware)
            .with_layers(middleware);

        let site = Site {
            method: &method,
            path: &path,
            pattern: pattern.as_str(),
        };
        dispatch::guarded(site, self.development, chain.run(req)).await
    }

    /// Every registered `(method, pattern)` pair.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.root
            .values()
            .into_iter()
            .flat_map(|endpoints| endpoints.handlers.iter())
            .map(|(method, endpoint)| (method.clone(), endpoint.pattern.to_string()))
            .collect()
    }

    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }
}
