use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{geocoder::GeocodeError, storage::StorageError};

/// DbError
///
/// Failure shapes raised by the persistence layer. The repository classifies raw
/// `sqlx` errors into these variants so the translator below can map them onto
/// the public error contract without inspecting driver internals.
#[derive(Debug, Error)]
pub enum DbError {
    /// A value could not be cast to the type of the column it targets
    /// (malformed identifier, non-numeric value for a numeric filter, ...).
    #[error("cannot cast `{value}` for field `{field}`")]
    Cast { field: String, value: String },

    /// Unique constraint violated (PG 23505).
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Not-null or check constraint violated (PG 23502 / 23514).
    #[error("{0}")]
    Constraint(String),

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("operator `{op}` is not supported for field `{field}`")]
    UnsupportedOperator { field: String, op: &'static str },

    #[error("{0}")]
    Query(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => return DbError::Duplicate(db_err.message().to_string()),
                Some("23502") | Some("23514") => {
                    return DbError::Constraint(db_err.message().to_string());
                }
                Some("22P02") => {
                    return DbError::Cast {
                        field: db_err.constraint().unwrap_or("value").to_string(),
                        value: db_err.message().to_string(),
                    };
                }
                _ => {}
            }
        }
        DbError::Query(err)
    }
}

/// AppError
///
/// The single failure type returned by every handler. `Response` is the
/// explicit "message + status" error raised by domain code; the remaining
/// variants wrap collaborator failures and are translated in `into_response`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Response { message: String, status: StatusCode },

    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        AppError::Response {
            message: message.into(),
            status,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    /// Authentication failure: missing, malformed, expired or unknown credentials.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    /// Role gate failure.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::FORBIDDEN)
    }

    /// Ownership failure. Existing clients expect 401 here, not 403.
    pub fn not_owner(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// translate
    ///
    /// Maps every failure onto the status code and message exposed to clients.
    pub fn translate(&self) -> (StatusCode, String) {
        match self {
            AppError::Response { message, status } => (*status, message.clone()),
            AppError::Validation(messages) => (StatusCode::BAD_REQUEST, messages.join(", ")),
            AppError::Db(DbError::Cast { .. }) => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            AppError::Db(DbError::Duplicate(_)) => (
                StatusCode::BAD_REQUEST,
                "Duplicate field value entered".to_string(),
            ),
            AppError::Db(DbError::Constraint(message)) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            AppError::Db(DbError::UnknownField(field)) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid query field: {}", field),
            ),
            AppError::Db(err @ DbError::UnsupportedOperator { .. }) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            other => {
                let message = other.to_string();
                let message = if message.is_empty() {
                    "Server Error".to_string()
                } else {
                    message
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.translate();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(%status, %error, "request rejected");
        }

        (
            status,
            Json(ErrorBody {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
