use axum::{
    Json, Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services: persistence, auth, query shaping and external integrations.
pub mod auth;
pub mod collections;
pub mod config;
pub mod error;
pub mod geocoder;
pub mod handlers;
pub mod models;
pub mod query;
pub mod rate_limit;
pub mod repository;
pub mod storage;

// Routing split by access level (public, authenticated, admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use geocoder::{GeocoderState, MapQuestGeocoder, MockGeocoder};
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{LocalDiskStorage, MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document aggregated from every `#[utoipa::path]` handler and the
/// schemas they exchange. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register, handlers::auth::login, handlers::auth::get_me,
        handlers::auth::update_details, handlers::auth::update_password, handlers::auth::logout,
        handlers::bootcamps::get_bootcamps, handlers::bootcamps::get_bootcamp,
        handlers::bootcamps::create_bootcamp, handlers::bootcamps::update_bootcamp,
        handlers::bootcamps::delete_bootcamp, handlers::bootcamps::get_bootcamps_in_radius,
        handlers::bootcamps::bootcamp_photo_upload,
        handlers::courses::get_courses, handlers::courses::get_bootcamp_courses,
        handlers::courses::get_course, handlers::courses::add_course,
        handlers::courses::update_course, handlers::courses::delete_course,
        handlers::reviews::get_reviews, handlers::reviews::get_bootcamp_reviews,
        handlers::reviews::get_review, handlers::reviews::add_review,
        handlers::reviews::update_review, handlers::reviews::delete_review,
        handlers::users::get_users, handlers::users::get_user, handlers::users::create_user,
        handlers::users::update_user, handlers::users::delete_user
    ),
    components(
        schemas(
            models::Role, models::User, models::Bootcamp, models::BootcampSummary,
            models::Course, models::Review, models::CreateBootcampRequest,
            models::UpdateBootcampRequest, models::CreateCourseRequest, models::UpdateCourseRequest,
            models::CreateReviewRequest, models::UpdateReviewRequest, models::RegisterRequest,
            models::LoginRequest, models::UpdateDetailsRequest, models::UpdatePasswordRequest,
            models::CreateUserRequest, models::UpdateUserRequest, models::TokenResponse,
        )
    ),
    tags(
        (name = "devcamper", description = "Bootcamp directory API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration, cloned into every
/// request. Handlers pick the parts they need through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: all persistence goes through this trait object.
    pub repo: RepositoryState,
    /// Storage Layer: where bootcamp photos are written.
    pub storage: StorageState,
    /// Address and zipcode lookup.
    pub geocoder: GeocoderState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for GeocoderState {
    fn from_ref(app_state: &AppState) -> GeocoderState {
        app_state.geocoder.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "success": false, "error": "Route not found" })),
    )
}

/// create_router
///
/// Assembles the routing tree under `/api/v1`, applies the auth layers and the
/// global rate limit, observability, header and CORS layers, and registers the state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let limiter = rate_limit::RateLimiter::from_config(&state.config);

    // Everything outside `public` needs a resolved principal. `protect` wraps the
    // role gates declared inside the sub-routers, so it always runs first.
    let protected = authenticated::authenticated_routes(state.config.max_file_upload)
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::protect));

    let api = public::public_routes().merge(protected);

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest("/api/v1", api);

    // Photos stored on disk are served back as static files.
    if state.config.storage == config::StorageBackend::Disk {
        router = router.nest_service("/uploads", ServeDir::new(&state.config.file_upload_path));
    }

    router
        .fallback(route_not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, rate_limit::limit))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                )),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its
/// method, URI and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
