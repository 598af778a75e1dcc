#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use devcamper_api::{
    AppConfig, AppState, create_router,
    auth::issue_token,
    error::DbError,
    geocoder::{GeocoderState, MockGeocoder},
    models::{
        Bootcamp, BootcampSummary, Course, NewBootcamp, NewCourse, NewReview, NewUser, Review,
        Role, UpdateBootcampRequest, UpdateCourseRequest, UpdateReviewRequest, UpdateUserRequest,
        User,
    },
    query::{Comparison, Filter, FindQuery},
    repository::{
        DbResult, Repository, RepositoryState,
        schema::{BOOTCAMPS, COURSES, ColumnKind, REVIEWS, Table, USERS},
    },
    storage::{MockStorageService, StorageState},
};
use serde::Serialize;
use serde_json::Value;
use std::{
    cmp::Ordering,
    sync::{Arc, Mutex, MutexGuard},
};
use tower::ServiceExt;
use uuid::Uuid;

// --- In-memory repository ---

#[derive(Default)]
struct Store {
    users: Vec<User>,
    bootcamps: Vec<Bootcamp>,
    courses: Vec<Course>,
    reviews: Vec<Review>,
}

/// InMemoryRepository
///
/// A `Repository` backed by vectors. Filters and sorts are resolved against the
/// same column maps the Postgres implementation uses, so unknown fields, bad casts
/// and unsupported operators fail the same way.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("store lock poisoned")
    }

    pub fn bootcamp_count(&self) -> usize {
        self.lock().bootcamps.len()
    }

    pub fn course_count(&self) -> usize {
        self.lock().courses.len()
    }
}

fn cast_error(field: &str, value: &str) -> DbError {
    DbError::Cast {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        // NULLS LAST, like Postgres on ascending order.
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Parses a raw filter value into the JSON shape the field serializes to.
fn typed(kind: ColumnKind, field: &str, raw: &str) -> DbResult<Value> {
    match kind {
        ColumnKind::Float | ColumnKind::Int => raw
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| cast_error(field, raw)),
        ColumnKind::Bool => raw
            .parse::<bool>()
            .map(Value::from)
            .map_err(|_| cast_error(field, raw)),
        ColumnKind::Uuid => raw
            .parse::<Uuid>()
            .map(|id| Value::from(id.to_string()))
            .map_err(|_| cast_error(field, raw)),
        ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::TextArray => {
            Ok(Value::from(raw.to_string()))
        }
    }
}

fn row_matches(table: &Table, item: &Value, filter: &Filter) -> DbResult<bool> {
    let column = table
        .column(&filter.field)
        .ok_or_else(|| DbError::UnknownField(filter.field.clone()))?;
    let actual = item.get(column.field).cloned().unwrap_or(Value::Null);
    let unsupported = || DbError::UnsupportedOperator {
        field: filter.field.clone(),
        op: filter.op.as_str(),
    };

    if column.kind == ColumnKind::TextArray {
        let items: Vec<&str> = actual
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        return match filter.op {
            Comparison::Eq => Ok(items.contains(&filter.value.as_str())),
            Comparison::Ne => Ok(!items.contains(&filter.value.as_str())),
            Comparison::In => Ok(filter.values().iter().any(|v| items.contains(v))),
            _ => Err(unsupported()),
        };
    }

    if filter.op == Comparison::In {
        let wanted = filter
            .values()
            .into_iter()
            .map(|v| typed(column.kind, &filter.field, v))
            .collect::<DbResult<Vec<_>>>()?;
        return Ok(wanted
            .iter()
            .any(|w| compare_json(&actual, w) == Ordering::Equal && !actual.is_null()));
    }

    let wanted = typed(column.kind, &filter.field, &filter.value)?;
    if matches!(column.kind, ColumnKind::Bool | ColumnKind::Uuid)
        && !matches!(filter.op, Comparison::Eq | Comparison::Ne)
    {
        return Err(unsupported());
    }

    let ord = compare_json(&actual, &wanted);
    Ok(match filter.op {
        Comparison::Eq => !actual.is_null() && ord == Ordering::Equal,
        Comparison::Ne => actual.is_null() || ord != Ordering::Equal,
        _ if actual.is_null() => false,
        Comparison::Gt => ord == Ordering::Greater,
        Comparison::Gte => ord != Ordering::Less,
        Comparison::Lt => ord == Ordering::Less,
        Comparison::Lte => ord != Ordering::Greater,
        Comparison::In => unreachable!(),
    })
}

fn filtered<T: Serialize + Clone>(
    table: &Table,
    rows: &[T],
    filters: &[Filter],
) -> DbResult<Vec<(Value, T)>> {
    let mut out = Vec::new();
    for row in rows {
        let value = serde_json::to_value(row).expect("rows serialize");
        let mut keep = true;
        for filter in filters {
            keep &= row_matches(table, &value, filter)?;
        }
        if keep {
            out.push((value, row.clone()));
        }
    }
    Ok(out)
}

fn run_find<T: Serialize + Clone>(table: &Table, rows: &[T], query: &FindQuery) -> DbResult<Vec<T>> {
    for key in &query.sort {
        if table.column(&key.field).is_none() {
            return Err(DbError::UnknownField(key.field.clone()));
        }
    }

    let mut hits = filtered(table, rows, &query.filters)?;
    hits.sort_by(|(a, _), (b, _)| {
        query
            .sort
            .iter()
            .map(|key| {
                let ord = compare_json(&a[key.field.as_str()], &b[key.field.as_str()]);
                if key.descending { ord.reverse() } else { ord }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| compare_json(&a["id"], &b["id"]))
    });

    Ok(hits
        .into_iter()
        .skip(query.skip.max(0) as usize)
        .take(query.limit.max(0) as usize)
        .map(|(_, row)| row)
        .collect())
}

fn run_count<T: Serialize + Clone>(table: &Table, rows: &[T], filters: &[Filter]) -> DbResult<i64> {
    Ok(filtered(table, rows, filters)?.len() as i64)
}

fn refresh_averages(store: &mut Store, bootcamp_id: Uuid) {
    let tuitions: Vec<f64> = store
        .courses
        .iter()
        .filter(|c| c.bootcamp_id == bootcamp_id)
        .map(|c| c.tuition)
        .collect();
    let ratings: Vec<f64> = store
        .reviews
        .iter()
        .filter(|r| r.bootcamp_id == bootcamp_id)
        .map(|r| r.rating as f64)
        .collect();

    if let Some(bootcamp) = store.bootcamps.iter_mut().find(|b| b.id == bootcamp_id) {
        bootcamp.average_cost = (!tuitions.is_empty())
            .then(|| (tuitions.iter().sum::<f64>() / tuitions.len() as f64 / 10.0).ceil() * 10.0);
        bootcamp.average_rating =
            (!ratings.is_empty()).then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> DbResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        let mut store = self.lock();
        if store.users.iter().any(|u| u.email == user.email) {
            return Err(DbError::Duplicate("users_email_key".into()));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            role: user.role,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        store.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> DbResult<Option<User>> {
        let mut store = self.lock();
        if let Some(email) = &req.email {
            if store.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(DbError::Duplicate("users_email_key".into()));
            }
        }
        let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            user.name = name;
        }
        if let Some(email) = req.email {
            user.email = email;
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        Ok(Some(user.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<bool> {
        let mut store = self.lock();
        Ok(match store.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn delete_user(&self, id: Uuid) -> DbResult<bool> {
        let mut store = self.lock();
        let before = store.users.len();
        store.users.retain(|u| u.id != id);
        let owned: Vec<Uuid> = store
            .bootcamps
            .iter()
            .filter(|b| b.user_id == id)
            .map(|b| b.id)
            .collect();
        store.bootcamps.retain(|b| b.user_id != id);
        store
            .courses
            .retain(|c| c.user_id != id && !owned.contains(&c.bootcamp_id));
        store
            .reviews
            .retain(|r| r.user_id != id && !owned.contains(&r.bootcamp_id));
        Ok(store.users.len() < before)
    }

    async fn find_users(&self, query: &FindQuery) -> DbResult<Vec<User>> {
        run_find(&USERS, &self.lock().users, query)
    }

    async fn count_users(&self, filters: &[Filter]) -> DbResult<i64> {
        run_count(&USERS, &self.lock().users, filters)
    }

    async fn get_bootcamp(&self, id: Uuid) -> DbResult<Option<Bootcamp>> {
        Ok(self.lock().bootcamps.iter().find(|b| b.id == id).cloned())
    }

    async fn find_bootcamp_by_owner(&self, user_id: Uuid) -> DbResult<Option<Bootcamp>> {
        Ok(self
            .lock()
            .bootcamps
            .iter()
            .find(|b| b.user_id == user_id)
            .cloned())
    }

    async fn create_bootcamp(&self, b: NewBootcamp) -> DbResult<Bootcamp> {
        let mut store = self.lock();
        if store.bootcamps.iter().any(|existing| existing.name == b.name) {
            return Err(DbError::Duplicate("bootcamps_name_key".into()));
        }
        let created = Bootcamp {
            id: Uuid::new_v4(),
            user_id: b.user_id,
            name: b.name,
            slug: b.slug,
            description: b.description,
            website: b.website,
            phone: b.phone,
            email: b.email,
            address: b.address,
            latitude: b.latitude,
            longitude: b.longitude,
            formatted_address: b.formatted_address,
            street: b.street,
            city: b.city,
            state: b.state,
            zipcode: b.zipcode,
            country: b.country,
            careers: b.careers,
            housing: b.housing,
            job_assistance: b.job_assistance,
            job_guarantee: b.job_guarantee,
            accept_gi: b.accept_gi,
            average_rating: None,
            average_cost: None,
            photo: "no-photo.jpg".to_string(),
            created_at: Utc::now(),
        };
        store.bootcamps.push(created.clone());
        Ok(created)
    }

    async fn update_bootcamp(
        &self,
        id: Uuid,
        req: UpdateBootcampRequest,
    ) -> DbResult<Option<Bootcamp>> {
        let mut store = self.lock();
        let Some(b) = store.bootcamps.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(v) = req.name {
            b.name = v;
        }
        if let Some(v) = req.description {
            b.description = v;
        }
        if let Some(v) = req.website {
            b.website = Some(v);
        }
        if let Some(v) = req.phone {
            b.phone = Some(v);
        }
        if let Some(v) = req.email {
            b.email = Some(v);
        }
        if let Some(v) = req.careers {
            b.careers = v;
        }
        if let Some(v) = req.housing {
            b.housing = v;
        }
        if let Some(v) = req.job_assistance {
            b.job_assistance = v;
        }
        if let Some(v) = req.job_guarantee {
            b.job_guarantee = v;
        }
        if let Some(v) = req.accept_gi {
            b.accept_gi = v;
        }
        Ok(Some(b.clone()))
    }

    async fn delete_bootcamp(&self, id: Uuid) -> DbResult<bool> {
        let mut store = self.lock();
        let before = store.bootcamps.len();
        store.bootcamps.retain(|b| b.id != id);
        store.courses.retain(|c| c.bootcamp_id != id);
        store.reviews.retain(|r| r.bootcamp_id != id);
        Ok(store.bootcamps.len() < before)
    }

    async fn set_bootcamp_photo(&self, id: Uuid, photo: &str) -> DbResult<Option<Bootcamp>> {
        let mut store = self.lock();
        Ok(store.bootcamps.iter_mut().find(|b| b.id == id).map(|b| {
            b.photo = photo.to_string();
            b.clone()
        }))
    }

    async fn bootcamps_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> DbResult<Vec<Bootcamp>> {
        Ok(self
            .lock()
            .bootcamps
            .iter()
            .filter(|b| match (b.latitude, b.longitude) {
                (Some(lat), Some(lng)) => within_radius((latitude, longitude), (lat, lng), radius),
                _ => false,
            })
            .cloned()
            .collect())
    }

    async fn find_bootcamps(&self, query: &FindQuery) -> DbResult<Vec<Bootcamp>> {
        run_find(&BOOTCAMPS, &self.lock().bootcamps, query)
    }

    async fn count_bootcamps(&self, filters: &[Filter]) -> DbResult<i64> {
        run_count(&BOOTCAMPS, &self.lock().bootcamps, filters)
    }

    async fn bootcamp_summaries(&self, ids: &[Uuid]) -> DbResult<Vec<BootcampSummary>> {
        Ok(self
            .lock()
            .bootcamps
            .iter()
            .filter(|b| ids.contains(&b.id))
            .map(|b| BootcampSummary {
                id: b.id,
                name: b.name.clone(),
                description: b.description.clone(),
            })
            .collect())
    }

    async fn get_course(&self, id: Uuid) -> DbResult<Option<Course>> {
        Ok(self.lock().courses.iter().find(|c| c.id == id).cloned())
    }

    async fn create_course(&self, c: NewCourse) -> DbResult<Course> {
        let mut store = self.lock();
        let created = Course {
            id: Uuid::new_v4(),
            bootcamp_id: c.bootcamp_id,
            user_id: c.user_id,
            title: c.title,
            description: c.description,
            weeks: c.weeks,
            tuition: c.tuition,
            minimum_skill: c.minimum_skill,
            scholarship_available: c.scholarship_available,
            created_at: Utc::now(),
        };
        store.courses.push(created.clone());
        refresh_averages(&mut store, created.bootcamp_id);
        Ok(created)
    }

    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> DbResult<Option<Course>> {
        let mut store = self.lock();
        let Some(c) = store.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(v) = req.title {
            c.title = v;
        }
        if let Some(v) = req.description {
            c.description = v;
        }
        if let Some(v) = req.weeks {
            c.weeks = v;
        }
        if let Some(v) = req.tuition {
            c.tuition = v;
        }
        if let Some(v) = req.minimum_skill {
            c.minimum_skill = v;
        }
        if let Some(v) = req.scholarship_available {
            c.scholarship_available = v;
        }
        let updated = c.clone();
        refresh_averages(&mut store, updated.bootcamp_id);
        Ok(Some(updated))
    }

    async fn delete_course(&self, id: Uuid) -> DbResult<bool> {
        let mut store = self.lock();
        let Some(bootcamp_id) = store.courses.iter().find(|c| c.id == id).map(|c| c.bootcamp_id)
        else {
            return Ok(false);
        };
        store.courses.retain(|c| c.id != id);
        refresh_averages(&mut store, bootcamp_id);
        Ok(true)
    }

    async fn find_courses(&self, query: &FindQuery) -> DbResult<Vec<Course>> {
        run_find(&COURSES, &self.lock().courses, query)
    }

    async fn count_courses(&self, filters: &[Filter]) -> DbResult<i64> {
        run_count(&COURSES, &self.lock().courses, filters)
    }

    async fn courses_for_bootcamps(&self, bootcamp_ids: &[Uuid]) -> DbResult<Vec<Course>> {
        Ok(self
            .lock()
            .courses
            .iter()
            .filter(|c| bootcamp_ids.contains(&c.bootcamp_id))
            .cloned()
            .collect())
    }

    async fn get_review(&self, id: Uuid) -> DbResult<Option<Review>> {
        Ok(self.lock().reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn create_review(&self, r: NewReview) -> DbResult<Review> {
        let mut store = self.lock();
        if store
            .reviews
            .iter()
            .any(|existing| existing.bootcamp_id == r.bootcamp_id && existing.user_id == r.user_id)
        {
            return Err(DbError::Duplicate("reviews_bootcamp_id_user_id_key".into()));
        }
        let created = Review {
            id: Uuid::new_v4(),
            bootcamp_id: r.bootcamp_id,
            user_id: r.user_id,
            title: r.title,
            text: r.text,
            rating: r.rating,
            created_at: Utc::now(),
        };
        store.reviews.push(created.clone());
        refresh_averages(&mut store, created.bootcamp_id);
        Ok(created)
    }

    async fn update_review(&self, id: Uuid, req: UpdateReviewRequest) -> DbResult<Option<Review>> {
        let mut store = self.lock();
        let Some(r) = store.reviews.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(v) = req.title {
            r.title = v;
        }
        if let Some(v) = req.text {
            r.text = v;
        }
        if let Some(v) = req.rating {
            r.rating = v;
        }
        let updated = r.clone();
        refresh_averages(&mut store, updated.bootcamp_id);
        Ok(Some(updated))
    }

    async fn delete_review(&self, id: Uuid) -> DbResult<bool> {
        let mut store = self.lock();
        let Some(bootcamp_id) = store.reviews.iter().find(|r| r.id == id).map(|r| r.bootcamp_id)
        else {
            return Ok(false);
        };
        store.reviews.retain(|r| r.id != id);
        refresh_averages(&mut store, bootcamp_id);
        Ok(true)
    }

    async fn find_reviews(&self, query: &FindQuery) -> DbResult<Vec<Review>> {
        run_find(&REVIEWS, &self.lock().reviews, query)
    }

    async fn count_reviews(&self, filters: &[Filter]) -> DbResult<i64> {
        run_count(&REVIEWS, &self.lock().reviews, filters)
    }
}

// --- Test application ---

pub const BOSTON: (f64, f64) = (42.3601, -71.0589);
pub const LOWELL: (f64, f64) = (42.6334, -71.3162);
pub const NEW_YORK: (f64, f64) = (40.7128, -74.0060);

/// Upload limit used by the test config, small enough to exceed in a test body.
pub const TEST_MAX_UPLOAD: usize = 1024;

pub fn test_config() -> AppConfig {
    AppConfig {
        max_file_upload: TEST_MAX_UPLOAD,
        ..AppConfig::default()
    }
}

/// Central angle (radians) between two points given in degrees (haversine).
pub fn central_angle(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * a.sqrt().min(1.0).asin()
}

/// Mirrors the haversine filter of the Postgres radius query.
pub fn within_radius(center: (f64, f64), point: (f64, f64), radius: f64) -> bool {
    central_angle(center.0, center.1, point.0, point.1) <= radius
}

/// The geocoder every test app starts with: two zipcodes and the seeded addresses.
pub fn test_geocoder() -> MockGeocoder {
    MockGeocoder::new()
        .with("02118", BOSTON.0, BOSTON.1)
        .with("10001", NEW_YORK.0, NEW_YORK.1)
        .with("233 Bay State Rd Boston MA 02215", BOSTON.0, BOSTON.1)
        .with("45 Upper College Rd Kingston RI 02881", 41.4807, -71.5258)
}

pub struct TestApp {
    pub router: Router,
    pub repo: InMemoryRepository,
    pub storage: MockStorageService,
    pub config: AppConfig,
}

pub struct Response {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(MockStorageService::new(), test_geocoder())
    }

    pub fn build(storage: MockStorageService, geocoder: MockGeocoder) -> Self {
        let repo = InMemoryRepository::new();
        let config = test_config();
        let state = AppState {
            repo: Arc::new(repo.clone()) as RepositoryState,
            storage: Arc::new(storage.clone()) as StorageState,
            geocoder: Arc::new(geocoder) as GeocoderState,
            config: config.clone(),
        };
        Self {
            router: create_router(state),
            repo,
            storage,
            config,
        }
    }

    /// Seeds a user directly. The password hash is left empty, so the account
    /// can act through a token but never log in.
    pub async fn user(&self, role: Role) -> (User, String) {
        let n = Uuid::new_v4().simple().to_string();
        let user = self
            .repo
            .create_user(NewUser {
                name: format!("{} {}", role, &n[..6]),
                email: format!("{}@example.com", n),
                role,
                password_hash: String::new(),
            })
            .await
            .expect("seed user");
        let token = self.token_for(user.id);
        (user, token)
    }

    pub fn token_for(&self, id: Uuid) -> String {
        issue_token(id, &self.config).expect("issue token")
    }

    pub async fn bootcamp(&self, owner: &User, name: &str) -> Bootcamp {
        self.bootcamp_at(owner, name, BOSTON).await
    }

    pub async fn bootcamp_at(&self, owner: &User, name: &str, at: (f64, f64)) -> Bootcamp {
        self.repo
            .create_bootcamp(NewBootcamp {
                user_id: owner.id,
                slug: name.to_lowercase().replace(' ', "-"),
                name: name.to_string(),
                description: format!("{} description", name),
                address: "somewhere".to_string(),
                latitude: Some(at.0),
                longitude: Some(at.1),
                careers: vec!["Web Development".to_string()],
                ..NewBootcamp::default()
            })
            .await
            .expect("seed bootcamp")
    }

    pub async fn course(&self, bootcamp: &Bootcamp, title: &str, tuition: f64) -> Course {
        self.repo
            .create_course(NewCourse {
                bootcamp_id: bootcamp.id,
                user_id: bootcamp.user_id,
                title: title.to_string(),
                description: "course".to_string(),
                weeks: 8,
                tuition,
                minimum_skill: "beginner".to_string(),
                scholarship_available: false,
            })
            .await
            .expect("seed course")
    }

    pub async fn review(&self, bootcamp: &Bootcamp, author: &User, rating: i32) -> Review {
        self.repo
            .create_review(NewReview {
                bootcamp_id: bootcamp.id,
                user_id: author.id,
                title: "Review".to_string(),
                text: "Text".to_string(),
                rating,
            })
            .await
            .expect("seed review")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Response { status, body }
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None, None).await
    }
}
