use crate::{
    AppState,
    auth::{ADMIN_ONLY, authorize},
    handlers,
};
use axum::{Router, middleware, routing::get};

/// Admin Router Module
///
/// User management. Mounted inside the authenticated group, so `protect` has
/// already resolved the principal when the admin role check runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(handlers::users::get_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(ADMIN_ONLY, authorize))
}
