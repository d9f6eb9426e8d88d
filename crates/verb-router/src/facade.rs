//! One router type for the server, whichever kind was configured.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::Method;
use axum::response::Response;

use crate::config::{FilesystemOptions, RouterConfig};
use crate::error::{MatchError, Result, RouterError};
use crate::fs::{FileRoute, FilesystemRouter, ModuleLoader, RouteChange};
use crate::handler::{Handler, Params};
use crate::middleware::Middleware;
use crate::router::Router;

/// Router kinds selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterKind {
    Manual,
    Filesystem,
}

impl RouterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterKind::Manual => "manual",
            RouterKind::Filesystem => "filesystem",
        }
    }
}

impl FromStr for RouterKind {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "manual" => Ok(RouterKind::Manual),
            "filesystem" => Ok(RouterKind::Filesystem),
            other => Err(RouterError::Configuration(format!(
                "unknown router type `{}` (expected `manual` or `filesystem`)",
                other
            ))),
        }
    }
}

impl fmt::Display for RouterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved route, independent of the router kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub pattern: String,
    pub params: Params,
}

/// The configured router.
///
/// Shared operations forward to the active router. Operations only one kind
/// provides fail with [`RouterError::Unsupported`] on the other.
pub enum UniversalRouter {
    Manual(Router),
    Filesystem(FilesystemRouter),
}

impl UniversalRouter {
    pub fn manual() -> Self {
        UniversalRouter::Manual(Router::new())
    }

    /// Builds the router described by `config`. Filesystem options are
    /// validated and the routes directory scanned before this returns.
    pub fn from_config(config: &RouterConfig, loader: Arc<dyn ModuleLoader>) -> Result<Self> {
        match config {
            RouterConfig::Manual => Ok(Self::manual()),
            RouterConfig::Filesystem(options) => Ok(UniversalRouter::Filesystem(
                FilesystemRouter::new(options.clone(), loader)?,
            )),
        }
    }

    /// Builds a router from a kind name such as `"filesystem"`. Missing
    /// filesystem options fall back to the defaults.
    pub fn from_kind(
        kind: &str,
        options: Option<FilesystemOptions>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Self> {
        let config = match kind.parse::<RouterKind>()? {
            RouterKind::Manual => RouterConfig::Manual,
            RouterKind::Filesystem => RouterConfig::Filesystem(options.unwrap_or_default()),
        };
        Self::from_config(&config, loader)
    }

    pub fn with_development(self, development: bool) -> Self {
        match self {
            UniversalRouter::Manual(router) => {
                UniversalRouter::Manual(router.with_development(development))
            }
            UniversalRouter::Filesystem(router) => {
                UniversalRouter::Filesystem(router.with_development(development))
            }
        }
    }

    pub fn kind(&self) -> RouterKind {
        match self {
            UniversalRouter::Manual(_) => RouterKind::Manual,
            UniversalRouter::Filesystem(_) => RouterKind::Filesystem,
        }
    }

    pub fn add_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        match self {
            UniversalRouter::Manual(router) => {
                router.add_middleware(middleware);
            }
            UniversalRouter::Filesystem(router) => {
                router.add_middleware(middleware);
            }
        }
        self
    }

    /// The filesystem router resolves by path only; method checks happen once
    /// the route's module is loaded.
    pub fn find_route(&self, method: &Method, path: &str) -> Result<RouteMatch, MatchError> {
        match self {
            UniversalRouter::Manual(router) => {
                let route = router.find_route(method, path)?;
                Ok(RouteMatch {
                    pattern: route.pattern.to_string(),
                    params: route.params,
                })
            }
            UniversalRouter::Filesystem(router) => {
                let found = router.find_route(path)?;
                Ok(RouteMatch {
                    pattern: found.route.pattern.to_string(),
                    params: found.params,
                })
            }
        }
    }

    pub async fn handle_request(&self, req: Request) -> Response {
        match self {
            UniversalRouter::Manual(router) => router.handle_request(req).await,
            UniversalRouter::Filesystem(router) => router.handle_request(req).await,
        }
    }

    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<&mut Self> {
        match self {
            UniversalRouter::Manual(router) => {
                router.add_route(method, pattern, handler)?;
            }
            UniversalRouter::Filesystem(_) => return Err(self.unsupported("add_route")),
        }
        Ok(self)
    }

    pub fn reload_route(&self, path: impl AsRef<Path>) -> Result<Option<RouteChange>> {
        match self {
            UniversalRouter::Filesystem(router) => Ok(router.reload_route(path)),
            UniversalRouter::Manual(_) => Err(self.unsupported("reload_route")),
        }
    }

    pub fn clear(&self) -> Result<u64> {
        match self {
            UniversalRouter::Filesystem(router) => Ok(router.clear()),
            UniversalRouter::Manual(_) => Err(self.unsupported("clear")),
        }
    }

    /// Discovered route files.
    pub fn routes(&self) -> Result<Vec<FileRoute>> {
        match self {
            UniversalRouter::Filesystem(router) => Ok(router.routes()),
            UniversalRouter::Manual(_) => Err(self.unsupported("routes")),
        }
    }

    pub fn as_manual(&self) -> Option<&Router> {
        match self {
            UniversalRouter::Manual(router) => Some(router),
            UniversalRouter::Filesystem(_) => None,
        }
    }

    pub fn as_manual_mut(&mut self) -> Option<&mut Router> {
        match self {
            UniversalRouter::Manual(router) => Some(router),
            UniversalRouter::Filesystem(_) => None,
        }
    }

    pub fn as_filesystem(&self) -> Option<&FilesystemRouter> {
        match self {
            UniversalRouter::Filesystem(router) => Some(router),
            UniversalRouter::Manual(_) => None,
        }
    }

    fn unsupported(&self, operation: &'static str) -> RouterError {
        RouterError::Unsupported {
            operation,
            kind: self.kind().as_str(),
        }
    }
}

impl From<Router> for UniversalRouter {
    fn from(router: Router) -> Self {
        UniversalRouter::Manual(router)
    }
}

impl From<FilesystemRouter> for UniversalRouter {
    fn from(router: FilesystemRouter) -> Self {
        UniversalRouter::Filesystem(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ModuleRegistry;
    use rstest::rstest;

    fn loader() -> Arc<dyn ModuleLoader> {
        Arc::new(ModuleRegistry::new())
    }

    #[rstest]
    #[case("manual", RouterKind::Manual)]
    #[case("filesystem", RouterKind::Filesystem)]
    #[case(" manual ", RouterKind::Manual)]
    fn test_parse_router_kind(#[case] input: &str, #[case] expected: RouterKind) {
        assert_eq!(input.parse::<RouterKind>().unwrap(), expected);
        assert_eq!(expected.to_string(), input.trim());
    }

    #[test]
    fn test_unknown_kind_is_configuration_error() {
        let err = UniversalRouter::from_kind("graphql", None, loader()).err().unwrap();
        assert!(matches!(err, RouterError::Configuration(msg) if msg.contains("graphql")));
    }

    #[test]
    fn test_invalid_filesystem_options_fail_at_construction() {
        let options = FilesystemOptions::new("/definitely/not/a/verb/routes/dir");
        let err = UniversalRouter::from_kind("filesystem", Some(options), loader())
            .err()
            .unwrap();
        assert!(matches!(err, RouterError::Configuration(_)));
    }

    #[test]
    fn test_kind_specific_operations() {
        let manual = UniversalRouter::manual();
        assert_eq!(manual.kind(), RouterKind::Manual);
        assert!(matches!(
            manual.clear(),
            Err(RouterError::Unsupported { operation: "clear", kind: "manual" })
        ));
        assert!(manual.reload_route("index.ts").is_err());
        assert!(manual.routes().is_err());
        assert!(manual.as_manual().is_some());
        assert!(manual.as_filesystem().is_none());

        let dir = tempfile::tempdir().unwrap();
        let mut fs = UniversalRouter::from_config(
            &RouterConfig::Filesystem(FilesystemOptions::new(dir.path())),
            loader(),
        )
        .unwrap();
        assert_eq!(fs.kind(), RouterKind::Filesystem);
        let err = fs
            .add_route(Method::GET, "/", |_req: Request| async {
                Ok::<_, anyhow::Error>(Response::default())
            })
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "`add_route` is not supported by the filesystem router"
        );
        assert_eq!(fs.clear().unwrap(), 2);
    }
}
