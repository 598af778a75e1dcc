use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    auth::hash_password,
    collections::Users,
    error::{AppError, AppResult},
    handlers::{AppJson, ResourceId},
    models::{ApiResponse, CreateUserRequest, Empty, NewUser, UpdateUserRequest, User, Validate},
    query::{AdvancedResults, ListQuery, shape},
};

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("No user with the id of {}", id))
}

/// get_users
///
/// [Admin Route] Shaped list of all accounts.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Paginated users", body = [User]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_users(
    State(state): State<AppState>,
    ListQuery(query): ListQuery,
) -> AppResult<AdvancedResults> {
    shape(&query, &Users(state.repo.clone()), None).await
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.repo.get_user(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::new(user)))
}

/// create_user
///
/// [Admin Route] Unlike self-registration, any role can be assigned here.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Validation failed or email taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    payload.validate()?;

    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name,
            email: payload.email.trim().to_lowercase(),
            role: payload.role.unwrap_or_default(),
            password_hash: hash_password(&payload.password)?,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(user))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AppJson(mut payload): AppJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    payload.validate()?;
    payload.email = payload.email.map(|e| e.trim().to_lowercase());

    let user = state
        .repo
        .update_user(id, payload)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::new(user)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<Empty>>> {
    if !state.repo.delete_user(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(user_id = %id, "user deleted");
    Ok(Json(ApiResponse::new(Empty {})))
}
