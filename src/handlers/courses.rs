use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, require_owner},
    collections::Courses,
    error::{AppError, AppResult},
    handlers::{AppJson, ResourceId},
    models::{ApiResponse, Course, CreateCourseRequest, Empty, NewCourse, UpdateCourseRequest, Validate},
    query::{AdvancedResults, ListQuery, Relation, shape},
};

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("No course with the id of {}", id))
}

/// get_courses
///
/// [Public Route] All courses, each with a summary of its bootcamp.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    responses((status = 200, description = "Paginated courses", body = [Course]))
)]
pub async fn get_courses(
    State(state): State<AppState>,
    ListQuery(query): ListQuery,
) -> AppResult<AdvancedResults> {
    shape(&query, &Courses(state.repo.clone()), Some(Relation::Bootcamp)).await
}

/// get_bootcamp_courses
///
/// [Public Route] Courses of one bootcamp, shaped like any other list.
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/{id}/courses",
    params(("id" = Uuid, Path, description = "Bootcamp id")),
    responses((status = 200, description = "Courses of the bootcamp", body = [Course]))
)]
pub async fn get_bootcamp_courses(
    State(state): State<AppState>,
    ResourceId(bootcamp_id): ResourceId,
    ListQuery(query): ListQuery,
) -> AppResult<AdvancedResults> {
    let query = query.scoped("bootcamp", bootcamp_id);
    shape(&query, &Courses(state.repo.clone()), None).await
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<Course>>> {
    let course = state.repo.get_course(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::new(course)))
}

/// add_course
///
/// [Publisher/Admin Route] Adds a course to a bootcamp the caller owns.
#[utoipa::path(
    post,
    path = "/api/v1/bootcamps/{id}/courses",
    params(("id" = Uuid, Path, description = "Bootcamp id")),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 401, description = "Not the bootcamp owner"),
        (status = 404, description = "Bootcamp not found")
    )
)]
pub async fn add_course(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(bootcamp_id): ResourceId,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Course>>)> {
    let bootcamp = state
        .repo
        .get_bootcamp(bootcamp_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("No bootcamp with the id of {}", bootcamp_id))
        })?;

    require_owner(&user, bootcamp.user_id, || {
        format!(
            "User {} is not authorized to add a course to bootcamp {}",
            user.id, bootcamp_id
        )
    })?;
    payload.validate()?;

    let course = state
        .repo
        .create_course(NewCourse {
            bootcamp_id,
            user_id: user.id,
            title: payload.title,
            description: payload.description,
            weeks: payload.weeks.unwrap_or_default(),
            tuition: payload.tuition.unwrap_or_default(),
            minimum_skill: payload.minimum_skill,
            scholarship_available: payload.scholarship_available,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(course))))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 401, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_course(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AppJson(payload): AppJson<UpdateCourseRequest>,
) -> AppResult<Json<ApiResponse<Course>>> {
    let course = state.repo.get_course(id).await?.ok_or_else(|| not_found(id))?;

    require_owner(&user, course.user_id, || {
        format!("User {} is not authorized to update course {}", user.id, id)
    })?;
    payload.validate()?;

    let updated = state
        .repo
        .update_course(id, payload)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::new(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_course(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let course = state.repo.get_course(id).await?.ok_or_else(|| not_found(id))?;

    require_owner(&user, course.user_id, || {
        format!("User {} is not authorized to delete course {}", user.id, id)
    })?;

    if !state.repo.delete_course(id).await? {
        return Err(not_found(id));
    }
    Ok(Json(ApiResponse::new(Empty {})))
}
