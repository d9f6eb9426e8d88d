//! Middleware composition.
//!
//! A middleware receives the request and a [`Next`] continuation. Calling
//! `next.run(req)` hands control to the following middleware, or to the
//! terminal handler at the end of the chain; returning without calling it
//! short-circuits. The response flows back through every middleware that
//! called `next`, in reverse order.
//!
//! The dispatch loop builds one [`Chain`] per request: global middleware in
//! registration order, then route-scoped middleware in registration order,
//! then the handler. `Next` is a cursor into that chain.

use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use futures::future::BoxFuture;

use crate::handler::{BoxHandler, HandlerResult};

/// An interceptor around a terminal handler.
///
/// Implemented for any `Fn(Request, Next) -> impl Future<Output = HandlerResult>`:
///
/// ```
/// use axum::extract::Request;
/// use verb_router::{Next, Router};
///
/// let mut router = Router::new();
/// router.add_middleware(|req: Request, next: Next| async move {
///     let mut res = next.run(req).await?;
///     res.headers_mut().insert("x-powered-by", "verb".parse()?);
///     Ok::<_, anyhow::Error>(res)
/// });
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(req, next))
    }
}

pub type BoxMiddleware = Arc<dyn Middleware>;

/// An ordered list of middleware around one terminal handler.
pub struct Chain {
    layers: Vec<BoxMiddleware>,
    endpoint: BoxHandler,
}

impl Chain {
    pub fn new(endpoint: BoxHandler) -> Self {
        Self {
            layers: Vec::new(),
            endpoint,
        }
    }

    /// Appends layers; they run after the layers already in the chain.
    pub fn with_layers<'a, I>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = &'a BoxMiddleware>,
    {
        self.layers.extend(layers.into_iter().cloned());
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub async fn run(self, req: Request) -> HandlerResult {
        Next {
            chain: Arc::new(self),
            position: 0,
        }
        .run(req)
        .await
    }
}

/// The rest of the chain, as seen from one middleware.
#[derive(Clone)]
pub struct Next {
    chain: Arc<Chain>,
    position: usize,
}

impl Next {
    /// Runs the remaining middleware and the handler.
    pub async fn run(self, req: Request) -> HandlerResult {
        match self.chain.layers.get(self.position).cloned() {
            Some(layer) => {
                let next = Next {
                    chain: Arc::clone(&self.chain),
                    position: self.position + 1,
                };
                layer.handle(req, next).await
            }
            None => self.chain.endpoint.call(req).await,
        }
    }

    /// Number of middleware still ahead of the handler.
    pub fn remaining(&self) -> usize {
        self.chain.layers.len().saturating_sub(self.position)
    }
}
