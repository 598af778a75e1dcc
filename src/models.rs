use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr, sync::LazyLock};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

// --- Roles ---

/// Role
///
/// The RBAC field of a principal. Stored as lowercase text in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Publisher,
    Admin,
}

#[derive(Debug, Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "publisher" => Ok(Role::Publisher),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered account. The password hash is loaded for credential checks but is
/// never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[serde(skip)]
    pub password_hash: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Bootcamp
///
/// The primary listing. Owned by exactly one user (`user`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bootcamp {
    pub id: Uuid,
    // FK to users.id (Owner).
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: String,

    // Resolved by the geocoder when the bootcamp is created.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub formatted_address: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,

    pub careers: Vec<String>,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,

    // Derived from courses and reviews by the repository.
    pub average_rating: Option<f64>,
    pub average_cost: Option<f64>,

    pub photo: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// BootcampSummary
///
/// The subset of a bootcamp embedded into courses and reviews when the
/// `bootcamp` relation is expanded.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct BootcampSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// Course
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    #[serde(rename = "bootcamp")]
    pub bootcamp_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    pub minimum_skill: String,
    pub scholarship_available: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Review
///
/// At most one review per (bootcamp, user), enforced by a unique index.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Review {
    pub id: Uuid,
    #[serde(rename = "bootcamp")]
    pub bootcamp_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub title: String,
    pub text: String,
    pub rating: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Insert Records (built by handlers, consumed by the repository) ---

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewBootcamp {
    pub user_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub formatted_address: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
    pub careers: Vec<String>,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    pub minimum_skill: String,
    pub scholarship_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewReview {
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub text: String,
    pub rating: i32,
}

// --- Request Payloads (Input Schemas) ---
//
// Create payloads default every field so that a missing field is reported by
// `validate` with a readable message rather than as a JSON rejection.

pub const CAREERS: [&str; 6] = [
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

pub const SKILL_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateBootcampRequest {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: String,
    pub careers: Vec<String>,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
}

/// UpdateBootcampRequest
///
/// Partial update: only the provided fields are written.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateBootcampRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub careers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_assistance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_guarantee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_gi: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub weeks: Option<i32>,
    pub tuition: Option<f64>,
    pub minimum_skill: String,
    pub scholarship_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuition: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scholarship_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct CreateReviewRequest {
    pub title: String,
    pub text: String,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

/// RegisterRequest
///
/// Self-service sign up. The password is hashed before it reaches the repository
/// and is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateDetailsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// CreateUserRequest
///
/// Admin-side account creation; unlike registration, any role may be assigned.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

// --- Response Envelopes (Output Schemas) ---

/// ApiResponse
///
/// Success envelope: `{ success: true, data, count? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data,
        }
    }
}

/// Empty object used as `data` for deletes and logout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default, PartialEq)]
pub struct Empty {}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

// --- Validation ---

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[\w.-]+\.[a-zA-Z]{2,}(:\d+)?([/?#]\S*)?$")
        .expect("url pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

/// Validator
///
/// Collects every failing rule so a single 400 can report all of them.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(message.into());
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

fn valid_careers(careers: &[String]) -> bool {
    careers.iter().all(|c| CAREERS.contains(&c.as_str()))
}

fn check_contact(
    v: &mut Validator,
    website: Option<&String>,
    phone: Option<&String>,
    email: Option<&String>,
) {
    if let Some(website) = website {
        v.check(
            is_valid_url(website),
            "Please use a valid URL with HTTP or HTTPS",
        );
    }
    if let Some(phone) = phone {
        v.check(
            phone.chars().count() <= 20,
            "Phone number can not be longer than 20 characters",
        );
    }
    if let Some(email) = email {
        v.check(is_valid_email(email), "Please add a valid email");
    }
}

impl Validate for CreateBootcampRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::default();
        v.check(!self.name.trim().is_empty(), "Please add a name")
            .check(
                self.name.chars().count() <= 50,
                "Name can not be more than 50 characters",
            )
            .check(
                !self.description.trim().is_empty(),
                "Please add a description",
            )
            .check(
                self.description.chars().count() <= 500,
                "Description can not be more than 500 characters",
            )
            .check(!self.address.trim().is_empty(), "Please add an address")
            .check(!self.careers.is_empty(), "Please add at least one career")
            .check(valid_careers(&self.careers), "Please select valid careers");
        check_contact(
            &mut v,
            self.website.as_ref(),
            self.phone.as_ref(),
            self.email.as_ref(),
        );
        v.finish()
    }
}

impl Validate for UpdateBootcampRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::default();
        if let Some(name) = &self.name {
            v.check(!name.trim().is_empty(), "Please add a name").check(
                name.chars().count() <= 50,
                "Name can not be more than 50 characters",
            );
        }
        if let Some(description) = &self.description {
            v.check(
                !description.trim().is_empty(),
                "Please add a description",
            )
            .check(
                description.chars().count() <= 500,
                "Description can not be more than 500 characters",
            );
        }
        if let Some(careers) = &self.careers {
            v.check(!careers.is_empty(), "Please add at least one career")
                .check(valid_careers(careers), "Please select valid careers");
        }
        check_contact(
            &mut v,
            self.website.as_ref(),
            self.phone.as_ref(),
            self.email.as_ref(),
        );
        v.finish()
    }
}

impl Validate for CreateCourseRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::default()
            .check(!self.title.trim().is_empty(), "Please add a course title")
            .check(
                !self.description.trim().is_empty(),
                "Please add a description",
            )
            .check(
                self.weeks.is_some_and(|w| w > 0),
                "Please add number of weeks",
            )
            .check(
                self.tuition.is_some_and(|t| t >= 0.0),
                "Please add a tuition cost",
            )
            .check(
                SKILL_LEVELS.contains(&self.minimum_skill.as_str()),
                "Please add a minimum skill",
            )
            .finish()
    }
}

impl Validate for UpdateCourseRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::default();
        if let Some(title) = &self.title {
            v.check(!title.trim().is_empty(), "Please add a course title");
        }
        if let Some(weeks) = self.weeks {
            v.check(weeks > 0, "Please add number of weeks");
        }
        if let Some(tuition) = self.tuition {
            v.check(tuition >= 0.0, "Please add a tuition cost");
        }
        if let Some(skill) = &self.minimum_skill {
            v.check(
                SKILL_LEVELS.contains(&skill.as_str()),
                "Please add a minimum skill",
            );
        }
        v.finish()
    }
}

fn valid_rating(rating: i32) -> bool {
    (1..=10).contains(&rating)
}

impl Validate for CreateReviewRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::default()
            .check(
                !self.title.trim().is_empty(),
                "Please add a title for the review",
            )
            .check(
                self.title.chars().count() <= 100,
                "Title can not be more than 100 characters",
            )
            .check(!self.text.trim().is_empty(), "Please add some text")
            .check(
                self.rating.is_some_and(valid_rating),
                "Please add a rating between 1 and 10",
            )
            .finish()
    }
}

impl Validate for UpdateReviewRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::default();
        if let Some(title) = &self.title {
            v.check(
                !title.trim().is_empty(),
                "Please add a title for the review",
            )
            .check(
                title.chars().count() <= 100,
                "Title can not be more than 100 characters",
            );
        }
        if let Some(rating) = self.rating {
            v.check(valid_rating(rating), "Please add a rating between 1 and 10");
        }
        v.finish()
    }
}

fn check_account(v: &mut Validator, name: &str, email: &str, password: &str) {
    v.check(!name.trim().is_empty(), "Please add a name")
        .check(is_valid_email(email), "Please add a valid email")
        .check(
            password.chars().count() >= 6,
            "Password must be at least 6 characters",
        );
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::default();
        check_account(&mut v, &self.name, &self.email, &self.password);
        v.check(
            self.role != Some(Role::Admin),
            "Role must be either user or publisher",
        );
        v.finish()
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::default();
        check_account(&mut v, &self.name, &self.email, &self.password);
        v.finish()
    }
}

impl Validate for UpdateDetailsRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::default();
        if let Some(name) = &self.name {
            v.check(!name.trim().is_empty(), "Please add a name");
        }
        if let Some(email) = &self.email {
            v.check(is_valid_email(email), "Please add a valid email");
        }
        v.finish()
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        UpdateDetailsRequest {
            name: self.name.clone(),
            email: self.email.clone(),
        }
        .validate()
    }
}

impl Validate for UpdatePasswordRequest {
    fn validate(&self) -> Result<(), AppError> {
        Validator::default()
            .check(
                !self.current_password.is_empty(),
                "Please provide your current password",
            )
            .check(
                self.new_password.chars().count() >= 6,
                "Password must be at least 6 characters",
            )
            .finish()
    }
}

/// slugify
///
/// URL-friendly form of a bootcamp name: lowercase ASCII alphanumerics joined by
/// single dashes.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Devworks Bootcamp"), "devworks-bootcamp");
        assert_eq!(slugify("  UI/UX -- Academy!"), "ui-ux-academy");
    }

    #[test]
    fn create_bootcamp_reports_every_missing_field() {
        let err = CreateBootcampRequest::default().validate().unwrap_err();
        let (_, message) = err.translate();
        assert!(message.contains("Please add a name"));
        assert!(message.contains("Please add a description"));
        assert!(message.contains("Please add an address"));
        assert!(message.contains("Please add at least one career"));
    }

    #[test]
    fn create_bootcamp_rejects_unknown_careers_and_bad_contacts() {
        let req = CreateBootcampRequest {
            name: "Codemasters".into(),
            description: "Learn".into(),
            address: "220 Pawtucket St, Lowell, MA 01854".into(),
            careers: vec!["Astrology".into()],
            website: Some("not a url".into()),
            email: Some("nobody".into()),
            ..Default::default()
        };
        let (_, message) = req.validate().unwrap_err().translate();
        assert_eq!(
            message,
            "Please select valid careers, Please use a valid URL with HTTP or HTTPS, Please add a valid email"
        );
    }

    #[test]
    fn review_rating_must_be_in_range() {
        let mut req = CreateReviewRequest {
            title: "Great".into(),
            text: "Learned a lot".into(),
            rating: Some(11),
        };
        assert!(req.validate().is_err());
        req.rating = Some(10);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn registration_cannot_claim_admin() {
        let req = RegisterRequest {
            name: "Mallory".into(),
            email: "mallory@example.com".into(),
            password: "123456".into(),
            role: Some(Role::Admin),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("publisher".parse::<Role>().unwrap(), Role::Publisher);
        assert!(Role::try_from("root".to_string()).is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            password_hash: "$argon2id$secret".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
