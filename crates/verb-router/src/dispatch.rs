//! The last line of defense between handlers and the transport.
//!
//! Whatever a handler or middleware does, the dispatch loop gets a response
//! back: errors and panics are logged and turned into a 500.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use axum::http::Method;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use tracing::error;

use crate::handler::HandlerResult;
use crate::response::ErrorResponse;

/// Identifies the request in failure logs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Site<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub pattern: &'a str,
}

/// Drives `fut` to completion and converts any failure into a 500.
pub(crate) async fn guarded<F>(site: Site<'_>, development: bool, fut: F) -> Response
where
    F: Future<Output = HandlerResult>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(res)) => res,
        Ok(Err(err)) => {
            error!(
                method = %site.method,
                path = site.path,
                pattern = site.pattern,
                "Handler failed: {:#}",
                err
            );
            ErrorResponse::internal(&err, development).into_response()
        }
        Err(payload) => {
            let err = anyhow::anyhow!("handler panicked: {}", panic_message(payload.as_ref()));
            error!(
                method = %site.method,
                path = site.path,
                pattern = site.pattern,
                "{}",
                err
            );
            ErrorResponse::internal(&err, development).into_response()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}
