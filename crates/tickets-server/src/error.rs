use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tickets_core::error::TicketsError;

// ---------------------------------------------------------------------------
// Internal sentinels for explicit status codes
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 409 through the `anyhow::Error` chain.
#[derive(Debug)]
struct ConflictError(String);

impl std::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConflictError {}

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain.
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

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self(ConflictError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<ConflictError>().is_some() {
            StatusCode::CONFLICT
        } else if self.0.downcast_ref::<BadRequestError>().is_some() {
            StatusCode::BAD_REQUEST
        } else if let Some(e) = self.0.downcast_ref::<TicketsError>() {
            match e {
                TicketsError::NotInitialized | TicketsError::InvalidInterval(_) => {
                    StatusCode::BAD_REQUEST
                }
                TicketsError::Tracker { .. }
                | TicketsError::TrackerResponse(_)
                | TicketsError::Http(_) => StatusCode::BAD_GATEWAY,
                TicketsError::SecretsNotFound(_)
                | TicketsError::MissingSecret(_)
                | TicketsError::Io(_)
                | TicketsError::Yaml(_)
                | TicketsError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
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
