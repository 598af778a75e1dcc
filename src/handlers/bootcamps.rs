use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
};
use std::path::Path as FsPath;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, require_owner},
    collections::Bootcamps,
    error::{AppError, AppResult},
    geocoder::angular_radius,
    handlers::{AppJson, ResourceId},
    models::{
        ApiResponse, Bootcamp, CreateBootcampRequest, Empty, NewBootcamp, UpdateBootcampRequest,
        Validate, slugify,
    },
    query::{AdvancedResults, ListQuery, Relation, shape},
};

fn not_found(id: impl std::fmt::Display) -> AppError {
    AppError::not_found(format!("Bootcamp not found with id of {}", id))
}

/// get_bootcamps
///
/// [Public Route] Shaped list of bootcamps with their courses embedded.
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps",
    responses(
        (status = 200, description = "Paginated bootcamps", body = [Bootcamp]),
        (status = 400, description = "Unknown filter field or operator")
    )
)]
pub async fn get_bootcamps(
    State(state): State<AppState>,
    ListQuery(query): ListQuery,
) -> AppResult<AdvancedResults> {
    shape(&query, &Bootcamps(state.repo.clone()), Some(Relation::Courses)).await
}

/// get_bootcamp
///
/// [Public Route] Single bootcamp by id.
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = Uuid, Path, description = "Bootcamp id")),
    responses(
        (status = 200, description = "Bootcamp", body = Bootcamp),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_bootcamp(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<Bootcamp>>> {
    let bootcamp = state
        .repo
        .get_bootcamp(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::new(bootcamp)))
}

/// create_bootcamp
///
/// [Publisher/Admin Route] Creates a bootcamp owned by the caller. A publisher may
/// own only one bootcamp; admins are exempt. The address is geocoded on the way in.
#[utoipa::path(
    post,
    path = "/api/v1/bootcamps",
    request_body = CreateBootcampRequest,
    responses(
        (status = 201, description = "Created", body = Bootcamp),
        (status = 400, description = "Validation failed or duplicate name"),
        (status = 401, description = "Already published a bootcamp")
    )
)]
pub async fn create_bootcamp(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBootcampRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Bootcamp>>)> {
    payload.validate()?;

    if !user.is_admin() && state.repo.find_bootcamp_by_owner(user.id).await?.is_some() {
        return Err(AppError::not_owner(format!(
            "The user with ID {} has already published a bootcamp",
            user.id
        )));
    }

    let location = state.geocoder.geocode(&payload.address).await?;

    let bootcamp = state
        .repo
        .create_bootcamp(NewBootcamp {
            user_id: user.id,
            slug: slugify(&payload.name),
            name: payload.name,
            description: payload.description,
            website: payload.website,
            phone: payload.phone,
            email: payload.email,
            address: payload.address,
            latitude: Some(location.latitude),
            longitude: Some(location.longitude),
            formatted_address: location.formatted_address,
            street: location.street,
            city: location.city,
            state: location.state,
            zipcode: location.zipcode,
            country: location.country,
            careers: payload.careers,
            housing: payload.housing,
            job_assistance: payload.job_assistance,
            job_guarantee: payload.job_guarantee,
            accept_gi: payload.accept_gi,
        })
        .await?;

    tracing::info!(bootcamp_id = %bootcamp.id, owner = %user.id, "bootcamp created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(bootcamp))))
}

/// update_bootcamp
///
/// [Publisher/Admin Route] Partial update, owner or admin only.
#[utoipa::path(
    put,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = Uuid, Path, description = "Bootcamp id")),
    request_body = UpdateBootcampRequest,
    responses(
        (status = 200, description = "Updated", body = Bootcamp),
        (status = 401, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_bootcamp(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AppJson(payload): AppJson<UpdateBootcampRequest>,
) -> AppResult<Json<ApiResponse<Bootcamp>>> {
    let bootcamp = state
        .repo
        .get_bootcamp(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    require_owner(&user, bootcamp.user_id, || {
        format!("User {} is not authorized to update this bootcamp", user.id)
    })?;
    payload.validate()?;

    let updated = state
        .repo
        .update_bootcamp(id, payload)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::new(updated)))
}

/// delete_bootcamp
///
/// [Publisher/Admin Route] Ownership is checked before anything is removed; the
/// bootcamp's courses and reviews go with it.
#[utoipa::path(
    delete,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = Uuid, Path, description = "Bootcamp id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_bootcamp(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let bootcamp = state
        .repo
        .get_bootcamp(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    require_owner(&user, bootcamp.user_id, || {
        format!("User {} is not authorized to delete this bootcamp", user.id)
    })?;

    if !state.repo.delete_bootcamp(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(bootcamp_id = %id, by = %user.id, "bootcamp deleted");
    Ok(Json(ApiResponse::new(Empty {})))
}

/// get_bootcamps_in_radius
///
/// [Public Route] Bootcamps within `distance` miles of the zipcode's location.
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/radius/{zipcode}/{distance}",
    params(
        ("zipcode" = String, Path, description = "Postal code at the center"),
        ("distance" = f64, Path, description = "Radius in miles")
    ),
    responses(
        (status = 200, description = "Bootcamps in radius", body = [Bootcamp]),
        (status = 400, description = "Invalid distance")
    )
)]
pub async fn get_bootcamps_in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Vec<Bootcamp>>>> {
    let distance = distance
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| AppError::bad_request("Please provide a valid distance"))?;

    let location = state.geocoder.geocode(&zipcode).await?;
    let radius = angular_radius(distance);

    let bootcamps = state
        .repo
        .bootcamps_within_radius(location.latitude, location.longitude, radius)
        .await?;
    Ok(Json(ApiResponse::list(bootcamps)))
}

/// Extension for the stored photo: the uploaded file's own, else the image subtype.
fn photo_extension(file_name: Option<&str>, content_type: &str) -> String {
    file_name
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| {
            content_type
                .split_once('/')
                .map(|(_, sub)| sub.split(['+', ';']).next().unwrap_or(sub))
                .unwrap_or("jpg")
                .to_ascii_lowercase()
        })
}

/// bootcamp_photo_upload
///
/// [Publisher/Admin Route] Multipart upload of the bootcamp photo (field `file`).
/// Every check runs before storage is touched: presence, `image/*` content type,
/// and the configured size limit.
#[utoipa::path(
    put,
    path = "/api/v1/bootcamps/{id}/photo",
    params(("id" = Uuid, Path, description = "Bootcamp id")),
    responses(
        (status = 200, description = "Stored file name", body = String),
        (status = 400, description = "Missing, non-image or oversized file"),
        (status = 401, description = "Not Owner"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Problem with file upload")
    )
)]
pub async fn bootcamp_photo_upload(
    user: AuthUser,
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<String>>> {
    let bootcamp = state
        .repo
        .get_bootcamp(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    require_owner(&user, bootcamp.user_id, || {
        format!("User {} is not authorized to update this bootcamp", user.id)
    })?;

    // A request that is not multipart at all carries no file.
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "photo upload without a multipart body");
        AppError::bad_request("Please upload a file")
    })?;

    let max = state.config.max_file_upload;
    let too_large = || AppError::bad_request(format!("Please upload an image less than {} bytes", max));
    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large()
        } else {
            AppError::bad_request(e.body_text())
        }
    };

    let mut upload = None;
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image") {
            return Err(AppError::bad_request("Please upload an image file"));
        }
        let file_name = field.file_name().map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > max {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        upload = Some((file_name, content_type, bytes));
        break;
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AppError::bad_request("Please upload a file"))?;

    let name = format!(
        "photo_{}.{}",
        id,
        photo_extension(file_name.as_deref(), &content_type)
    );
    let stored = state.storage.save(&name, &content_type, bytes).await?;

    state
        .repo
        .set_bootcamp_photo(id, &stored)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(bootcamp_id = %id, photo = %stored, "bootcamp photo uploaded");
    Ok(Json(ApiResponse::new(stored)))
}
