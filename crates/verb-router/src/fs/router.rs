//! File-based router.
//!
//! Routes come from the [`RouteScanner`]; the code behind each route is
//! loaded on first use through a [`ModuleLoader`] and cached together with
//! the generation stamp of the route it was loaded for. Reloading a route
//! gives it a new stamp, so the next request loads a fresh module while every
//! other cached module stays valid.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::Request;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tracing::debug;

use super::loader::{ModuleLoader, RouteModule};
use super::scanner::{FileRoute, RouteChange, RouteScanner};
use crate::config::FilesystemOptions;
use crate::dispatch::{self, Site};
use crate::error::{MatchError, Result};
use crate::handler::{HandlerResult, Params};
use crate::middleware::{BoxMiddleware, Chain, Middleware};
use crate::response::ErrorResponse;

#[derive(Clone)]
struct CachedModule {
    generation: u64,
    module: Arc<RouteModule>,
}

/// A matched route file and the parameters bound from the path.
#[derive(Debug, Clone)]
pub struct FileMatch {
    pub route: Arc<FileRoute>,
    pub params: Params,
}

pub struct FilesystemRouter {
    scanner: RouteScanner,
    middleware: Vec<BoxMiddleware>,
    cache: DashMap<String, CachedModule>,
    loader: Arc<dyn ModuleLoader>,
    development: bool,
}

impl FilesystemRouter {
    /// Validates `options` and scans the routes directory. Invalid options
    /// fail here rather than on the first request.
    pub fn new(options: FilesystemOptions, loader: Arc<dyn ModuleLoader>) -> Result<Self> {
        Ok(Self {
            scanner: RouteScanner::new(options)?,
            middleware: Vec::new(),
            cache: DashMap::new(),
            loader,
            development: false,
        })
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn development(&self) -> bool {
        self.development
    }

    pub fn add_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn root(&self) -> &Path {
        self.scanner.root()
    }

    pub fn scanner(&self) -> &RouteScanner {
        &self.scanner
    }

    /// Resolves a path to its route file. The method plays no part here: a
    /// route's methods are only known once its module is loaded.
    pub fn find_route(&self, path: &str) -> Result<FileMatch, MatchError> {
        self.scanner
            .find(path)
            .map(|(route, params)| FileMatch { route, params })
            .ok_or(MatchError::NotFound)
    }

    pub async fn handle_request(&self, mut req: Request) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let FileMatch { route, params } = match self.find_route(&path) {
            Ok(found) => found,
            Err(err) => {
                debug!("{} {} -> {}", method, path, err);
                return ErrorResponse::from(err).into_response();
            }
        };

        debug!("{} {} -> {} ({})", method, path, route.pattern, route.key());
        req.extensions_mut().insert(params);

        let site = Site {
            method: &method,
            path: &path,
            pattern: route.pattern.as_str(),
        };
        dispatch::guarded(site, self.development, self.dispatch(&route, &method, req)).await
    }

    async fn dispatch(&self, route: &FileRoute, method: &Method, req: Request) -> HandlerResult {
        let module = self.module(route).await?;

        let Some(handler) = module.handler_for(method) else {
            return Ok(ErrorResponse::method_not_allowed(&module.allowed()).into_response());
        };

        Chain::new(Arc::clone(handler))
            .with_layers(&self.middleware)
            .with_layers(module.middleware())
            .run(req)
            .await
    }

    /// Returns the module for `route`, loading it when nothing is cached for
    /// the route's current generation.
    async fn module(&self, route: &FileRoute) -> anyhow::Result<Arc<RouteModule>> {
        let key = route.pattern.to_string();
        let cached = self
            .cache
            .get(&key)
            .filter(|entry| entry.generation == route.generation)
            .map(|entry| Arc::clone(&entry.module));
        if let Some(module) = cached {
            return Ok(module);
        }

        debug!("Loading module for {} (generation {})", key, route.generation);
        let module = self
            .loader
            .load(route)
            .await
            .with_context(|| format!("failed to load route module {:?}", route.source))?;
        let module = Arc::new(module);

        // Concurrent loads may race; keep whichever is for the newest generation.
        let fresh = CachedModule {
            generation: route.generation,
            module: Arc::clone(&module),
        };
        self.cache
            .entry(key)
            .and_modify(|entry| {
                if entry.generation < fresh.generation {
                    *entry = fresh.clone();
                }
            })
            .or_insert_with(|| fresh.clone());

        Ok(module)
    }

    /// Re-examines one route file and drops its cached module.
    pub fn reload_route(&self, path: impl AsRef<Path>) -> Option<RouteChange> {
        let change = self.scanner.reload_route(path)?;
        if let Some(pattern) = &change.pattern {
            self.cache.remove(pattern);
        }
        Some(change)
    }

    /// Full rescan of the routes directory.
    pub fn rescan(&self) -> RouteChange {
        let change = self.scanner.scan();
        self.cache.clear();
        change
    }

    /// Drops all routes and cached modules.
    pub fn clear(&self) -> u64 {
        let generation = self.scanner.clear();
        self.cache.clear();
        generation
    }

    pub fn routes(&self) -> Vec<FileRoute> {
        self.scanner.routes()
    }

    pub fn generation(&self) -> u64 {
        self.scanner.generation()
    }

    /// Number of modules currently cached.
    pub fn cached_modules(&self) -> usize {
        self.cache.len()
    }
}
