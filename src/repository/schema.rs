//! Column maps used to turn API field names into SQL.
//!
//! Filter and sort fields arriving from the query string are only ever looked up
//! here; nothing from the request is spliced into SQL unless it matches an entry.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Float,
    Int,
    Bool,
    Uuid,
    Timestamp,
    TextArray,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Name exposed in JSON and accepted in query strings.
    pub field: &'static str,
    pub column: &'static str,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn column(&self, field: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.field == field)
    }
}

const fn col(field: &'static str, column: &'static str, kind: ColumnKind) -> Column {
    Column {
        field,
        column,
        kind,
    }
}

use ColumnKind::*;

pub const USERS: Table = Table {
    name: "users",
    columns: &[
        col("id", "id", Uuid),
        col("name", "name", Text),
        col("email", "email", Text),
        col("role", "role", Text),
        col("createdAt", "created_at", Timestamp),
    ],
};

pub const BOOTCAMPS: Table = Table {
    name: "bootcamps",
    columns: &[
        col("id", "id", Uuid),
        col("user", "user_id", Uuid),
        col("name", "name", Text),
        col("slug", "slug", Text),
        col("description", "description", Text),
        col("website", "website", Text),
        col("phone", "phone", Text),
        col("email", "email", Text),
        col("address", "address", Text),
        col("latitude", "latitude", Float),
        col("longitude", "longitude", Float),
        col("formattedAddress", "formatted_address", Text),
        col("street", "street", Text),
        col("city", "city", Text),
        col("state", "state", Text),
        col("zipcode", "zipcode", Text),
        col("country", "country", Text),
        col("careers", "careers", TextArray),
        col("housing", "housing", Bool),
        col("jobAssistance", "job_assistance", Bool),
        col("jobGuarantee", "job_guarantee", Bool),
        col("acceptGi", "accept_gi", Bool),
        col("averageRating", "average_rating", Float),
        col("averageCost", "average_cost", Float),
        col("photo", "photo", Text),
        col("createdAt", "created_at", Timestamp),
    ],
};

pub const COURSES: Table = Table {
    name: "courses",
    columns: &[
        col("id", "id", Uuid),
        col("bootcamp", "bootcamp_id", Uuid),
        col("user", "user_id", Uuid),
        col("title", "title", Text),
        col("description", "description", Text),
        col("weeks", "weeks", Int),
        col("tuition", "tuition", Float),
        col("minimumSkill", "minimum_skill", Text),
        col("scholarshipAvailable", "scholarship_available", Bool),
        col("createdAt", "created_at", Timestamp),
    ],
};

pub const REVIEWS: Table = Table {
    name: "reviews",
    columns: &[
        col("id", "id", Uuid),
        col("bootcamp", "bootcamp_id", Uuid),
        col("user", "user_id", Uuid),
        col("title", "title", Text),
        col("text", "text", Text),
        col("rating", "rating", Int),
        col("createdAt", "created_at", Timestamp),
    ],
};
