use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no token: every read on bootcamps, courses and reviews,
/// plus registration and login.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // --- Auth gateway ---
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // --- Bootcamps ---
        // GET /bootcamps?housing=true&averageCost[lte]=10000&select=name&sort=-name&page=2
        .route("/bootcamps", get(handlers::bootcamps::get_bootcamps))
        .route("/bootcamps/{id}", get(handlers::bootcamps::get_bootcamp))
        // Zipcode is geocoded; distance is in miles.
        .route(
            "/bootcamps/radius/{zipcode}/{distance}",
            get(handlers::bootcamps::get_bootcamps_in_radius),
        )
        .route(
            "/bootcamps/{id}/courses",
            get(handlers::courses::get_bootcamp_courses),
        )
        .route(
            "/bootcamps/{id}/reviews",
            get(handlers::reviews::get_bootcamp_reviews),
        )
        // --- Courses ---
        .route("/courses", get(handlers::courses::get_courses))
        .route("/courses/{id}", get(handlers::courses::get_course))
        // --- Reviews ---
        .route("/reviews", get(handlers::reviews::get_reviews))
        .route("/reviews/{id}", get(handlers::reviews::get_review))
}
