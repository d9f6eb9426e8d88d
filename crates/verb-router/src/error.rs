//! Error types for route registration, lookup and router construction.

use axum::http::Method;
use thiserror::Error;

/// Failures surfaced to setup code: registration, configuration and
/// administrative operations. These never cross the dispatch boundary.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Malformed registration, e.g. a wildcard that is not the last segment.
    #[error("conflicting route `{pattern}`: {reason}")]
    Conflict { pattern: String, reason: String },

    /// Unknown router kind or invalid filesystem options.
    #[error("invalid router configuration: {0}")]
    Configuration(String),

    /// Operation that only one router kind provides.
    #[error("`{operation}` is not supported by the {kind} router")]
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RouterError {
    pub(crate) fn conflict(pattern: &str, reason: impl Into<String>) -> Self {
        RouterError::Conflict {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Outcome of a failed lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("no route matches the requested path")]
    NotFound,

    /// The path is routed, but not for the requested method.
    #[error("method not allowed (allowed: {})", format_allowed(.allowed))]
    MethodNotAllowed { allowed: Vec<Method> },
}

/// Renders a method list the way the `Allow` header expects it.
pub fn format_allowed(allowed: &[Method]) -> String {
    allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Adds `HEAD` when `GET` is served, since `GET` handlers answer `HEAD` too.
pub(crate) fn with_implicit_head(mut methods: Vec<Method>) -> Vec<Method> {
    if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
        methods.push(Method::HEAD);
    }
    methods
}

pub type Result<T, E = RouterError> = std::result::Result<T, E>;
