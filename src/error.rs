use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Failures a request handler does not recover from itself.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("list {0} not found")]
    ListNotFound(i64),
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ViewError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ViewError::ListNotFound(_) | ViewError::UserNotFound(_))
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        match self {
            ViewError::ListNotFound(_) | ViewError::UserNotFound(_) => {
                tracing::info!("{}", self);
                (StatusCode::NOT_FOUND, Html(crate::templates::not_found())).into_response()
            }
            ViewError::Storage(e) => {
                tracing::error!(error = %crate::unpack_error(&*e), "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(crate::templates::server_error())).into_response()
            }
        }
    }
}
