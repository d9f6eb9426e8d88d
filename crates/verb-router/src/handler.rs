//! Terminal handlers and path parameters.

use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;

/// What handlers and middleware produce. Errors become a 500 at the dispatch
/// boundary.
pub type HandlerResult = anyhow::Result<Response>;

/// A terminal request handler.
///
/// Implemented for any `Fn(Request) -> impl Future<Output = HandlerResult>`,
/// so plain `async fn`s can be registered directly:
///
/// ```
/// use axum::extract::Request;
/// use axum::response::IntoResponse;
/// use verb_router::{HandlerResult, Router};
/// use axum::http::Method;
///
/// async fn hello(_req: Request) -> HandlerResult {
///     Ok("hello".into_response())
/// }
///
/// let mut router = Router::new();
/// router.add_route(Method::GET, "/hello", hello).unwrap();
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(req))
    }
}

pub type BoxHandler = Arc<dyn Handler>;

/// Parameter bindings extracted from the request path, in pattern order.
///
/// Stored in the request extensions before the middleware chain runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs parameter names with the values captured during matching.
    pub fn from_captures(names: &[String], captures: Vec<String>) -> Self {
        Self(names.iter().cloned().zip(captures).collect())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Access to the parameters bound by the router.
pub trait RequestExt {
    fn params(&self) -> Option<&Params>;

    fn param(&self, name: &str) -> Option<&str> {
        self.params().and_then(|params| params.get(name))
    }
}

impl<B> RequestExt for axum::http::Request<B> {
    fn params(&self) -> Option<&Params> {
        self.extensions().get::<Params>()
    }
}
