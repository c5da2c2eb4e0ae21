use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use intersection_core::IntersectionError;

/// Private sentinel carrying an explicit 400 through the `anyhow::Error`
/// chain for request-shape problems the core has no variant for.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }
}

fn status_for(err: &IntersectionError) -> StatusCode {
    match err {
        IntersectionError::IncompleteInput { .. } => StatusCode::BAD_REQUEST,
        IntersectionError::InvalidLane(_) => StatusCode::NOT_FOUND,
        IntersectionError::RunInProgress | IntersectionError::RunCancelled => StatusCode::CONFLICT,
        IntersectionError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        IntersectionError::ServiceError { .. } | IntersectionError::MalformedAssignment(_) => {
            StatusCode::BAD_GATEWAY
        }
        IntersectionError::InvalidConfig(_)
        | IntersectionError::Io(_)
        | IntersectionError::Yaml(_)
        | IntersectionError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(b) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": b.0.clone(), "kind": "bad_request" });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let (status, kind) = match self.0.downcast_ref::<IntersectionError>() {
            Some(e) => (status_for(e), e.kind()),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = serde_json::json!({ "error": self.0.to_string(), "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
