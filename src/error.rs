use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n\n{}", self.0, self.0.backtrace()),
        )
            .into_response()
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

/// Failures with a meaning the client can act on, as opposed to the
/// catch-all [`AppError`] 500 path.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("your sign-in did not include a name, email, and picture")]
    IncompleteIdentity,
    #[error("the handle {0:?} is already taken")]
    HandleTaken(String),
    #[error("a profile already exists for this account")]
    ProfileExists,
    #[error("the backend is currently unavailable, try again")]
    Backend(#[source] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::IncompleteIdentity => StatusCode::BAD_REQUEST,
            ApiError::HandleTaken(_) | ApiError::ProfileExists => StatusCode::CONFLICT,
            ApiError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let mut body = json!({ "error": self.to_string() });
        if let ApiError::HandleTaken(_) = &self {
            // handle conflicts attach to the input field, not the whole form
            body["field"] = "handle".into();
        }
        (status, Json(body)).into_response()
    }
}

pub(crate) fn classify_store_error(
    err: sqlx::Error,
    conflict: impl FnOnce() -> ApiError,
) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => conflict(),
        _ => ApiError::Backend(err),
    }
}

pub(crate) fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "sign in first" })),
    )
        .into_response()
}

pub(crate) fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no such {what}") })),
    )
        .into_response()
}
