// verb-router/src/response.rs: structured error responses produced by the dispatch loop
use axum::http::header::ALLOW;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{format_allowed, MatchError};

/// A JSON error body with the status it travels with.
///
/// Every failure the router turns into a response goes through this type, so
/// clients always see `{"error": "..."}`.
#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
    detail: Option<String>,
    allow: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
            allow: None,
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    /// 405 carrying an `Allow` header with exactly `allowed`.
    pub fn method_not_allowed(allowed: &[Method]) -> Self {
        let mut res = Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        res.allow = Some(format_allowed(allowed));
        res
    }

    /// 500 for a failed handler. The underlying error is only echoed to the
    /// client in development mode.
    pub fn internal(err: &anyhow::Error, development: bool) -> Self {
        let mut res = Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        if development {
            res.detail = Some(format!("{:#}", err));
        }
        res
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            detail: self.detail,
        });

        let mut res = (self.status, body).into_response();
        if let Some(allow) = self.allow.and_then(|a| HeaderValue::from_str(&a).ok()) {
            res.headers_mut().insert(ALLOW, allow);
        }
        res
    }
}

impl From<MatchError> for ErrorResponse {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::NotFound => ErrorResponse::not_found(),
            MatchError::MethodNotAllowed { allowed } => ErrorResponse::method_not_allowed(&allowed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_method_not_allowed_sets_allow_header() {
        let res = ErrorResponse::from(MatchError::MethodNotAllowed {
            allowed: vec![Method::GET, Method::POST],
        })
        .into_response();

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[ALLOW], "GET, POST");
        assert_eq!(body_json(res).await, serde_json::json!({ "error": "Method Not Allowed" }));
    }

    #[tokio::test]
    async fn test_internal_hides_detail_outside_development() {
        let err = anyhow::anyhow!("database password is hunter2");

        let res = ErrorResponse::internal(&err, false).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(res).await, serde_json::json!({ "error": "Internal Server Error" }));

        let res = ErrorResponse::internal(&err, true).into_response();
        assert_eq!(
            body_json(res).await,
            serde_json::json!({
                "error": "Internal Server Error",
                "detail": "database password is hunter2",
            })
        );
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorResponse::from(MatchError::NotFound).status(), StatusCode::NOT_FOUND);
    }
}
