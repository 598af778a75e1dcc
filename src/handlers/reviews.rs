use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, require_owner},
    collections::Reviews,
    error::{AppError, AppResult},
    handlers::{AppJson, ResourceId},
    models::{ApiResponse, CreateReviewRequest, Empty, NewReview, Review, UpdateReviewRequest, Validate},
    query::{AdvancedResults, ListQuery, Relation, shape},
};

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("No review found with the id of {}", id))
}

#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    responses((status = 200, description = "Paginated reviews", body = [Review]))
)]
pub async fn get_reviews(
    State(state): State<AppState>,
    ListQuery(query): ListQuery,
) -> AppResult<AdvancedResults> {
    shape(&query, &Reviews(state.repo.clone()), Some(Relation::Bootcamp)).await
}

#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/{id}/reviews",
    params(("id" = Uuid, Path, description = "Bootcamp id")),
    responses((status = 200, description = "Reviews of the bootcamp", body = [Review]))
)]
pub async fn get_bootcamp_reviews(
    State(state): State<AppState>,
    ResourceId(bootcamp_id): ResourceId,
    ListQuery(query): ListQuery,
) -> AppResult<AdvancedResults> {
    let query = query.scoped("bootcamp", bootcamp_id);
    shape(&query, &Reviews(state.repo.clone()), None).await
}

#[utoipa::path(
    get,
    path = "/api/v1/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review", body = Review),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_review(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<Review>>> {
    let review = state.repo.get_review(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::new(review)))
}

/// add_review
///
/// [User/Admin Route] One review per user and bootcamp; a second attempt hits the
/// unique index and comes back as a duplicate-field error.
#[utoipa::path(
    post,
    path = "/api/v1/bootcamps/{id}/reviews",
    params(("id" = Uuid, Path, description = "Bootcamp id")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Created", body = Review),
        (status = 400, description = "Validation failed or already reviewed"),
        (status = 404, description = "Bootcamp not found")
    )
)]
pub async fn add_review(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(bootcamp_id): ResourceId,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    state
        .repo
        .get_bootcamp(bootcamp_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("No bootcamp with the id of {}", bootcamp_id))
        })?;
    payload.validate()?;

    let review = state
        .repo
        .create_review(NewReview {
            bootcamp_id,
            user_id: user.id,
            title: payload.title,
            text: payload.text,
            rating: payload.rating.unwrap_or_default(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(review))))
}

#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review id")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Updated", body = Review),
        (status = 401, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_review(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let review = state.repo.get_review(id).await?.ok_or_else(|| not_found(id))?;

    require_owner(&user, review.user_id, || {
        "Not authorized to update review".to_string()
    })?;
    payload.validate()?;

    let updated = state
        .repo
        .update_review(id, payload)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::new(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_review(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let review = state.repo.get_review(id).await?.ok_or_else(|| not_found(id))?;

    require_owner(&user, review.user_id, || {
        "Not authorized to delete review".to_string()
    })?;

    if !state.repo.delete_review(id).await? {
        return Err(not_found(id));
    }
    Ok(Json(ApiResponse::new(Empty {})))
}
