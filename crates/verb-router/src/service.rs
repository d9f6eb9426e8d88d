//! `tower::Service` adapter, so the router can be mounted on an axum server.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;
use tower::Service;

use crate::facade::UniversalRouter;

/// Serves requests through a shared [`UniversalRouter`].
///
/// ```no_run
/// use std::sync::Arc;
/// use verb_router::{RouterService, UniversalRouter};
///
/// let router = Arc::new(UniversalRouter::manual());
/// let app: axum::Router = axum::Router::new().fallback_service(RouterService::new(router));
/// ```
#[derive(Clone)]
pub struct RouterService {
    router: Arc<UniversalRouter>,
}

impl RouterService {
    pub fn new(router: Arc<UniversalRouter>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Arc<UniversalRouter> {
        &self.router
    }
}

impl Service<Request> for RouterService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let router = Arc::clone(&self.router);
        Box::pin(async move { Ok(router.handle_request(req).await) })
    }
}
