use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy.
///
/// Every public operation catches these and converts them to its documented
/// response shape; nothing here is allowed to escape to the transport layer
/// as an unhandled fault. Messages are what a caller may see. Transport
/// and database detail stays in the logs.
#[derive(Debug, Error)]
pub enum AppError {
    /// An equipment row with this identity already exists (either the
    /// fast-path check or the UNIQUE constraint race loser).
    #[error("duplicate device")]
    DuplicateDevice,

    /// Transport failure or non-success reply from the remote
    /// VPN/certificate service. Always this generic message; callers must
    /// not see raw transport errors.
    #[error("network connection error")]
    RemoteUnavailable,

    /// Provisioning token failed to decode or had the wrong shape. Kept
    /// generic so decode failures cannot be used as an oracle.
    #[error("invalid token")]
    InvalidToken,

    /// Equipment lookup miss. Indistinguishable from `InvalidToken` at the
    /// device-facing boundary.
    #[error("no router found")]
    DeviceNotFound,

    /// A template variant was rendered without one of its required fields.
    /// Indicates server misconfiguration, not a client problem.
    #[error("missing config field: {0}")]
    TemplateFieldMissing(&'static str),

    #[error("database error: {0}")]
    Database(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::DuplicateDevice => (StatusCode::CONFLICT, self.to_string()),
            AppError::RemoteUnavailable => (StatusCode::BAD_GATEWAY, self.to_string()),
            // Which half of the token/device binding failed must not be
            // observable, so both collapse to the same response.
            AppError::InvalidToken | AppError::DeviceNotFound => {
                (StatusCode::NOT_FOUND, "no router found".to_string())
            }
            AppError::TemplateFieldMissing(field) => {
                tracing::error!(field = %field, "config template rendered with missing field");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server configuration error".to_string(),
                )
            }
            AppError::Database(detail) | AppError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
