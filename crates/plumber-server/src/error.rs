use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Rejected request. `message` goes back to the caller as the body;
    /// `detail` only reaches the log.
    #[error("{message}")]
    BadRequest {
        message: String,
        detail: Option<String>,
    },

    #[error("stage error: {0}")]
    Stage(#[from] plumber_stage::StageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            detail: None,
        }
    }

    pub fn bad_request_with(message: impl Into<String>, detail: impl ToString) -> Self {
        Self::BadRequest {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest { message, detail } => {
                match &detail {
                    Some(detail) => tracing::warn!("{message}: {detail}"),
                    None => tracing::warn!("{message}"),
                }
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            other => {
                tracing::error!("request failed: {other}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error: internal failure").into_response()
            }
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
