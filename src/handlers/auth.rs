use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::{AuthUser, hash_password, issue_token, verify_password},
    error::{AppError, AppResult},
    handlers::AppJson,
    models::{
        ApiResponse, Empty, LoginRequest, NewUser, RegisterRequest, TokenResponse,
        UpdateDetailsRequest, UpdatePasswordRequest, UpdateUserRequest, User, Validate,
    },
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn token_response(user: &User, state: &AppState) -> AppResult<Json<TokenResponse>> {
    Ok(Json(TokenResponse {
        success: true,
        token: issue_token(user.id, &state.config)?,
    }))
}

fn current_user_missing() -> AppError {
    AppError::unauthorized("Not authorized to access this route")
}

/// register
///
/// [Public Route] Creates an account with role `user` or `publisher` and returns a token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = TokenResponse),
        (status = 400, description = "Validation failed or email taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<TokenResponse>> {
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

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    token_response(&user, &state)
}

/// login
///
/// [Public Route] Exchanges email and password for a token. Unknown email and wrong
/// password produce the same 401.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let (Some(email), Some(password)) = (
        payload.email.filter(|e| !e.trim().is_empty()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request("Please provide an email and password"));
    };

    let user = state
        .repo
        .find_user_by_email(email.trim())
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

    if !verify_password(&password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "login with wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    token_response(&user, &state)
}

/// get_me
///
/// [Authenticated Route] The caller's own account.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses((status = 200, description = "Current user", body = User))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(current_user_missing)?;
    Ok(Json(ApiResponse::new(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/updatedetails",
    request_body = UpdateDetailsRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Validation failed or email taken")
    )
)]
pub async fn update_details(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateDetailsRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    payload.validate()?;

    let user = state
        .repo
        .update_user(
            id,
            UpdateUserRequest {
                name: payload.name,
                email: payload.email.map(|e| e.trim().to_lowercase()),
                role: None,
            },
        )
        .await?
        .ok_or_else(current_user_missing)?;
    Ok(Json(ApiResponse::new(user)))
}

/// update_password
///
/// [Authenticated Route] Requires the current password and returns a fresh token.
#[utoipa::path(
    put,
    path = "/api/v1/auth/updatepassword",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = TokenResponse),
        (status = 401, description = "Password is incorrect")
    )
)]
pub async fn update_password(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> AppResult<Json<TokenResponse>> {
    payload.validate()?;

    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(current_user_missing)?;

    if !verify_password(&payload.current_password, &user.password_hash) {
        return Err(AppError::unauthorized("Password is incorrect"));
    }

    let hash = hash_password(&payload.new_password)?;
    if !state.repo.update_password(id, &hash).await? {
        return Err(current_user_missing());
    }

    tracing::info!(user_id = %id, "password changed");
    token_response(&user, &state)
}

/// logout
///
/// [Authenticated Route] Tokens are stateless, so there is nothing to revoke.
#[utoipa::path(
    get,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout(_user: AuthUser) -> Json<ApiResponse<Empty>> {
    Json(ApiResponse::new(Empty {}))
}
