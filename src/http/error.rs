//! Terminal error handling.
//!
//! # Responsibilities
//! - Turn handler errors and panics into a JSON 500
//! - Hide error detail in production
//! - Log every failure with its cause chain
//!
//! # Response Shape
//! ```text
//! { "error": "Internal Server Error", "message": "...", "stack": "..." }
//! ```
//! `message` and `stack` are only present outside production.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::{Environment, Settings};
use crate::observability::metrics;

const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Error returned by request handlers.
///
/// Anything convertible into [`anyhow::Error`] converts into this with `?`.
/// The response carries a [`HandlerFailure`] that the error stage renders.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failure = HandlerFailure {
            kind: FailureKind::Error,
            message: self.0.to_string(),
            stack: error_chain(&*self.0),
        };
        failure.into_response()
    }
}

/// What went wrong inside a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Error,
    Panic,
    /// A 5xx produced by middleware rather than a handler.
    Layer,
}

impl FailureKind {
    fn as_label(self) -> &'static str {
        match self {
            FailureKind::Error => "error",
            FailureKind::Panic => "panic",
            FailureKind::Layer => "layer",
        }
    }
}

/// Failure details attached to a 500 response as an extension.
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    pub kind: FailureKind,
    pub message: String,
    pub stack: String,
}

impl IntoResponse for HandlerFailure {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// JSON body of every 500 this service produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorBody {
    pub fn new(environment: Environment, message: String, stack: String) -> Self {
        let (message, stack) = if environment.is_production() {
            (None, None)
        } else {
            (Some(message), Some(stack))
        };
        Self {
            error: INTERNAL_SERVER_ERROR.to_string(),
            message,
            stack,
        }
    }
}

/// Build a JSON 500 response.
pub fn internal_error(environment: Environment, message: String, stack: String) -> Response {
    let body = ErrorBody::new(environment, message, stack);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Middleware rendering [`HandlerFailure`]s. Installed outside the panic catcher.
///
/// Bare 5xx responses from inner layers (a session store that failed to
/// persist, for instance) have no body; they get the same JSON shape.
pub async fn error_stage(
    State(settings): State<Arc<Settings>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let failure = match response.extensions().get::<HandlerFailure>() {
        Some(failure) => failure.clone(),
        None if is_bare_server_error(&response) => {
            let status = response.status();
            let message = status
                .canonical_reason()
                .unwrap_or(INTERNAL_SERVER_ERROR)
                .to_string();
            HandlerFailure {
                kind: FailureKind::Layer,
                stack: format!("{} returned by middleware", status),
                message,
            }
        }
        None => return response,
    };

    tracing::error!(
        method = %method,
        path = %path,
        kind = failure.kind.as_label(),
        error = %failure.stack,
        "Unhandled error while processing request"
    );
    metrics::record_handler_failure(failure.kind.as_label());

    internal_error(settings.environment, failure.message, failure.stack)
}

fn is_bare_server_error(response: &Response) -> bool {
    response.status().is_server_error() && !response.headers().contains_key(CONTENT_TYPE)
}

/// Response for a panicking handler, used with `CatchPanicLayer::custom`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };

    HandlerFailure {
        kind: FailureKind::Panic,
        stack: format!("panic: {}", message),
        message,
    }
    .into_response()
}

/// Render an error and its sources, one cause per line.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str("\n  caused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_chain_lists_causes() {
        let err = std::fs::read("/definitely/not/here")
            .context("reading fixture")
            .unwrap_err();
        let chain = error_chain(&*err);

        assert!(chain.starts_with("reading fixture"));
        assert!(chain.contains("caused by: "));
    }

    #[test]
    fn test_production_body_hides_detail() {
        let body = ErrorBody::new(Environment::Production, "boom".into(), "boom\n  at x".into());
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "error": "Internal Server Error" })
        );
    }

    #[test]
    fn test_development_body_has_detail() {
        let body = ErrorBody::new(Environment::Development, "boom".into(), "stack".into());
        assert_eq!(body.message.as_deref(), Some("boom"));
        assert_eq!(body.stack.as_deref(), Some("stack"));
    }

    #[test]
    fn test_api_error_attaches_failure() {
        let response = ApiError::from(anyhow::anyhow!("lookup failed")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let failure = response.extensions().get::<HandlerFailure>().unwrap();
        assert_eq!(failure.kind, FailureKind::Error);
        assert_eq!(failure.message, "lookup failed");
    }

    fn stage_router(environment: Environment) -> axum::Router {
        let mut settings = Settings::default();
        settings.environment = environment;

        axum::Router::new()
            .route(
                "/bare",
                axum::routing::get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            )
            .route(
                "/typed",
                axum::routing::get(|| async {
                    (StatusCode::BAD_GATEWAY, Json(serde_json::json!({ "upstream": "down" })))
                }),
            )
            .route(
                "/missing",
                axum::routing::get(|| async { StatusCode::NOT_FOUND }),
            )
            .layer(axum::middleware::from_fn_with_state(
                Arc::new(settings),
                error_stage,
            ))
    }

    async fn call(router: axum::Router, path: &str) -> (StatusCode, axum::body::Bytes) {
        use tower::ServiceExt;

        let request = axum::http::Request::builder()
            .uri(path)
            .body(axum::body::Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_bare_server_error_gets_json_body() {
        let (status, body) = call(stage_router(Environment::Development), "/bare").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "Internal Server Error");
        assert_eq!(body.message.as_deref(), Some("Service Unavailable"));
        assert!(body.stack.is_some());

        let (_, body) = call(stage_router(Environment::Production), "/bare").await;
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Internal Server Error" }));
    }

    #[tokio::test]
    async fn test_responses_with_a_body_pass_through() {
        let (status, body) = call(stage_router(Environment::Development), "/typed").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(&body[..], br#"{"upstream":"down"}"#);

        let (status, body) = call(stage_router(Environment::Development), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[test]
    fn test_panic_payloads() {
        let response = panic_response(Box::new("static message"));
        let failure = response.extensions().get::<HandlerFailure>().unwrap();
        assert_eq!(failure.message, "static message");
        assert_eq!(failure.kind, FailureKind::Panic);

        let response = panic_response(Box::new(String::from("owned message")));
        let failure = response.extensions().get::<HandlerFailure>().unwrap();
        assert_eq!(failure.message, "owned message");

        let response = panic_response(Box::new(42_u8));
        let failure = response.extensions().get::<HandlerFailure>().unwrap();
        assert_eq!(failure.message, "handler panicked");
    }
}
