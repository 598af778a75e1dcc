use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, error::AppError, models::Role, repository::RepositoryState};

const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Role sets accepted by [`authorize`].
pub const PUBLISHER_OR_ADMIN: &[Role] = &[Role::Publisher, Role::Admin];
pub const USER_OR_ADMIN: &[Role] = &[Role::User, Role::Admin];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Claims
///
/// The payload signed into every bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id. Resolved against the users table on every request.
    pub sub: Uuid,
    /// Expiration Time (exp): tokens are rejected after this timestamp.
    pub exp: usize,
    /// Issued At (iat)
    pub iat: usize,
}

/// AuthUser
///
/// The resolved principal of an authenticated request. Handlers take it as an
/// argument to learn who is acting and with which role.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Reuses the principal `protect` already attached to the request, if any.
/// 2. Otherwise extracts the `Bearer` token and verifies signature and expiry.
/// 3. Looks the subject up in the repository so deleted users lose access at once.
///
/// Rejection: every failure is the same 401; the reason is only logged.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized(NOT_AUTHORIZED))?;

        let claims = verify_token(token, &config)?;

        let user = repo
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %claims.sub, "token subject no longer exists");
                AppError::unauthorized(NOT_AUTHORIZED)
            })?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

/// verify_token
///
/// Decodes and validates a token (signature and `exp`).
pub fn verify_token(token: &str, config: &AppConfig) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(reason = ?e.kind(), "rejected bearer token");
            AppError::unauthorized(NOT_AUTHORIZED)
        })
}

/// issue_token
///
/// Signs a token for `user_id` that expires after `config.jwt_expire_secs`.
pub fn issue_token(user_id: Uuid, config: &AppConfig) -> Result<String, AppError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + config.jwt_expire_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.into()))
}

/// protect
///
/// Middleware that authenticates the request and stores the principal in the
/// request extensions for everything downstream.
pub async fn protect(user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// authorize
///
/// Role gate. Mounted with `from_fn_with_state(ROLES, authorize)` after
/// `protect`, it only inspects the principal already attached to the request.
pub async fn authorize(
    State(roles): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::unauthorized(NOT_AUTHORIZED))?;

    if !roles.contains(&user.role) {
        return Err(AppError::forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )));
    }
    Ok(next.run(request).await)
}

/// require_owner
///
/// Passes for the owner of a resource and for admins.
pub fn require_owner(
    user: &AuthUser,
    owner_id: Uuid,
    message: impl FnOnce() -> String,
) -> Result<(), AppError> {
    if user.id == owner_id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::not_owner(message()))
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// A stored hash that cannot be parsed never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
