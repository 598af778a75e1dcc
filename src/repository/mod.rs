use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::DbError,
    models::{
        Bootcamp, BootcampSummary, Course, NewBootcamp, NewCourse, NewReview, NewUser, Review,
        UpdateBootcampRequest, UpdateCourseRequest, UpdateReviewRequest, UpdateUserRequest, User,
    },
    query::{FindQuery, Filter},
};

mod postgres;
pub mod schema;

pub use postgres::PostgresRepository;

pub type DbResult<T> = Result<T, DbError>;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers and the query
/// shaper only ever talk to this trait, so the Postgres implementation can be
/// replaced by an in-memory one in tests.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) shareable across Axum's task boundaries.
///
/// Update and delete methods do not check ownership; handlers do that before
/// calling them. `Ok(None)` / `Ok(false)` mean the row did not exist.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> DbResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> DbResult<User>;
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> DbResult<Option<User>>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<bool>;
    async fn delete_user(&self, id: Uuid) -> DbResult<bool>;
    async fn find_users(&self, query: &FindQuery) -> DbResult<Vec<User>>;
    async fn count_users(&self, filters: &[Filter]) -> DbResult<i64>;

    // --- Bootcamps ---
    async fn get_bootcamp(&self, id: Uuid) -> DbResult<Option<Bootcamp>>;
    // Any bootcamp owned by `user_id`; backs the one-bootcamp-per-publisher rule.
    async fn find_bootcamp_by_owner(&self, user_id: Uuid) -> DbResult<Option<Bootcamp>>;
    async fn create_bootcamp(&self, bootcamp: NewBootcamp) -> DbResult<Bootcamp>;
    async fn update_bootcamp(
        &self,
        id: Uuid,
        req: UpdateBootcampRequest,
    ) -> DbResult<Option<Bootcamp>>;
    // Cascades to the bootcamp's courses and reviews.
    async fn delete_bootcamp(&self, id: Uuid) -> DbResult<bool>;
    async fn set_bootcamp_photo(&self, id: Uuid, photo: &str) -> DbResult<Option<Bootcamp>>;
    /// Bootcamps whose location lies within the spherical cap of angular
    /// `radius` (radians) around the given point.
    async fn bootcamps_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> DbResult<Vec<Bootcamp>>;
    async fn find_bootcamps(&self, query: &FindQuery) -> DbResult<Vec<Bootcamp>>;
    async fn count_bootcamps(&self, filters: &[Filter]) -> DbResult<i64>;
    async fn bootcamp_summaries(&self, ids: &[Uuid]) -> DbResult<Vec<BootcampSummary>>;

    // --- Courses ---
    // Writes recompute the parent bootcamp's average cost.
    async fn get_course(&self, id: Uuid) -> DbResult<Option<Course>>;
    async fn create_course(&self, course: NewCourse) -> DbResult<Course>;
    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> DbResult<Option<Course>>;
    async fn delete_course(&self, id: Uuid) -> DbResult<bool>;
    async fn find_courses(&self, query: &FindQuery) -> DbResult<Vec<Course>>;
    async fn count_courses(&self, filters: &[Filter]) -> DbResult<i64>;
    async fn courses_for_bootcamps(&self, bootcamp_ids: &[Uuid]) -> DbResult<Vec<Course>>;

    // --- Reviews ---
    // Writes recompute the parent bootcamp's average rating.
    async fn get_review(&self, id: Uuid) -> DbResult<Option<Review>>;
    async fn create_review(&self, review: NewReview) -> DbResult<Review>;
    async fn update_review(&self, id: Uuid, req: UpdateReviewRequest) -> DbResult<Option<Review>>;
    async fn delete_review(&self, id: Uuid) -> DbResult<bool>;
    async fn find_reviews(&self, query: &FindQuery) -> DbResult<Vec<Review>>;
    async fn count_reviews(&self, filters: &[Filter]) -> DbResult<i64>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
