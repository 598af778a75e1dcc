use crate::{
    AppState,
    auth::{PUBLISHER_OR_ADMIN, USER_OR_ADMIN, authorize},
    handlers,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};

/// Room for multipart framing around the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Authenticated Router Module
///
/// Everything here sits behind the `protect` layer applied in `create_router`,
/// so handlers always receive a resolved `AuthUser`. Ownership is checked inside
/// the handlers; roles are checked by the `authorize` layers below.
pub fn authenticated_routes(max_file_upload: usize) -> Router<AppState> {
    Router::new()
        .merge(account_routes())
        .merge(publisher_routes(max_file_upload))
        .merge(reviewer_routes())
}

/// Any signed-in role: the caller's own account.
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/auth/updatedetails", put(handlers::auth::update_details))
        .route("/auth/updatepassword", put(handlers::auth::update_password))
        .route("/auth/logout", get(handlers::auth::logout))
}

/// Publishers and admins: bootcamp and course management.
fn publisher_routes(max_file_upload: usize) -> Router<AppState> {
    Router::new()
        // One bootcamp per publisher; admins are exempt.
        .route("/bootcamps", post(handlers::bootcamps::create_bootcamp))
        .route(
            "/bootcamps/{id}",
            put(handlers::bootcamps::update_bootcamp).delete(handlers::bootcamps::delete_bootcamp),
        )
        // Oversized bodies are cut off here; the handler turns that into a 400.
        .route(
            "/bootcamps/{id}/photo",
            put(handlers::bootcamps::bootcamp_photo_upload)
                .layer(DefaultBodyLimit::max(max_file_upload + MULTIPART_OVERHEAD)),
        )
        .route("/bootcamps/{id}/courses", post(handlers::courses::add_course))
        .route(
            "/courses/{id}",
            put(handlers::courses::update_course).delete(handlers::courses::delete_course),
        )
        .route_layer(middleware::from_fn_with_state(PUBLISHER_OR_ADMIN, authorize))
}

/// Users and admins: reviews. Publishers do not review.
fn reviewer_routes() -> Router<AppState> {
    Router::new()
        .route("/bootcamps/{id}/reviews", post(handlers::reviews::add_review))
        .route(
            "/reviews/{id}",
            put(handlers::reviews::update_review).delete(handlers::reviews::delete_review),
        )
        .route_layer(middleware::from_fn_with_state(USER_OR_ADMIN, authorize))
}
