//! Resource handlers. Each one is a thin orchestration over the repository:
//! existence and ownership checks, validation, and the success envelope.
//! Every failure is returned as an [`AppError`] and rendered by the translator.

use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::{AppError, DbError};

pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod reviews;
pub mod users;

/// AppJson
///
/// `Json` whose rejection goes through the error translator, so malformed bodies
/// get the same `{success:false, error}` envelope as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// ResourceId
///
/// The `{id}` path segment as a UUID. A segment that is not a UUID is treated like
/// any other uncastable identifier: 404 `Resource not found`.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub Uuid);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        raw.parse::<Uuid>().map(ResourceId).map_err(|_| {
            AppError::Db(DbError::Cast {
                field: "id".to_string(),
                value: raw,
            })
        })
    }
}
