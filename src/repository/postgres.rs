use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::str::FromStr;
use uuid::Uuid;

use super::{
    DbResult, Repository,
    schema::{self, Column, ColumnKind, Table},
};
use crate::{
    error::DbError,
    models::{
        Bootcamp, BootcampSummary, Course, NewBootcamp, NewCourse, NewReview, NewUser, Review,
        UpdateBootcampRequest, UpdateCourseRequest, UpdateReviewRequest, UpdateUserRequest, User,
        slugify,
    },
    query::{Comparison, FindQuery, Filter},
};

const USER_COLUMNS: &str = "id, name, email, role, password_hash, created_at";

const BOOTCAMP_COLUMNS: &str = "id, user_id, name, slug, description, website, phone, email, \
    address, latitude, longitude, formatted_address, street, city, state, zipcode, country, \
    careers, housing, job_assistance, job_guarantee, accept_gi, average_rating, average_cost, \
    photo, created_at";

const COURSE_COLUMNS: &str = "id, bootcamp_id, user_id, title, description, weeks, tuition, \
    minimum_skill, scholarship_available, created_at";

const REVIEW_COLUMNS: &str = "id, bootcamp_id, user_id, title, text, rating, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// All statements are built at runtime; dynamic list queries go through
/// `QueryBuilder` with bound parameters only.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Recomputes `average_cost` as the mean tuition rounded up to the next ten.
    async fn refresh_average_cost<'e, E>(executor: E, bootcamp_id: Uuid) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"UPDATE bootcamps
               SET average_cost = (SELECT CEIL(AVG(tuition) / 10) * 10 FROM courses WHERE bootcamp_id = $1)
               WHERE id = $1"#,
        )
        .bind(bootcamp_id)
        .execute(executor)
        .await
        .map_err(|e| logged("refresh_average_cost", e))?;
        Ok(())
    }

    async fn refresh_average_rating<'e, E>(executor: E, bootcamp_id: Uuid) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"UPDATE bootcamps
               SET average_rating = (SELECT AVG(rating)::float8 FROM reviews WHERE bootcamp_id = $1)
               WHERE id = $1"#,
        )
        .bind(bootcamp_id)
        .execute(executor)
        .await
        .map_err(|e| logged("refresh_average_rating", e))?;
        Ok(())
    }

    async fn find<T>(&self, op: &str, table: &Table, columns: &str, query: &FindQuery) -> DbResult<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let mut builder = build_find(table, columns, query)?;
        builder
            .build_query_as::<T>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| logged(op, e))
    }

    async fn count(&self, op: &str, table: &Table, filters: &[Filter]) -> DbResult<i64> {
        let mut builder = build_count(table, filters)?;
        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| logged(op, e))
    }

    async fn delete_by_id(&self, op: &str, table: &Table, id: Uuid) -> DbResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table.name);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| logged(op, e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Classifies a driver error and logs the ones that are not the caller's fault.
fn logged(op: &str, err: sqlx::Error) -> DbError {
    let err = DbError::from(err);
    match &err {
        DbError::Query(inner) => tracing::error!("{} error: {:?}", op, inner),
        other => tracing::debug!("{} rejected: {}", op, other),
    }
    err
}

// --- Dynamic query construction ---

fn parse<T: FromStr>(field: &str, raw: &str) -> DbResult<T> {
    raw.trim().parse::<T>().map_err(|_| DbError::Cast {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn parse_all<T: FromStr>(field: &str, raws: &[&str]) -> DbResult<Vec<T>> {
    raws.iter().map(|raw| parse(field, raw)).collect()
}

/// Binds a single raw value with the Rust type matching the column.
fn push_value(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &Column,
    field: &str,
    raw: &str,
) -> DbResult<()> {
    match column.kind {
        ColumnKind::Text | ColumnKind::TextArray => builder.push_bind(raw.to_string()),
        ColumnKind::Float => builder.push_bind(parse::<f64>(field, raw)?),
        ColumnKind::Int => builder.push_bind(parse::<i32>(field, raw)?),
        ColumnKind::Bool => builder.push_bind(parse::<bool>(field, raw)?),
        ColumnKind::Uuid => builder.push_bind(parse::<Uuid>(field, raw)?),
        ColumnKind::Timestamp => builder.push_bind(parse::<DateTime<Utc>>(field, raw)?),
    };
    Ok(())
}

/// Binds a list of raw values as a Postgres array of the column's element type.
fn push_values(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &Column,
    field: &str,
    raws: &[&str],
) -> DbResult<()> {
    match column.kind {
        ColumnKind::Text | ColumnKind::TextArray => {
            builder.push_bind(raws.iter().map(|v| v.to_string()).collect::<Vec<_>>())
        }
        ColumnKind::Float => builder.push_bind(parse_all::<f64>(field, raws)?),
        ColumnKind::Int => builder.push_bind(parse_all::<i32>(field, raws)?),
        ColumnKind::Bool => builder.push_bind(parse_all::<bool>(field, raws)?),
        ColumnKind::Uuid => builder.push_bind(parse_all::<Uuid>(field, raws)?),
        ColumnKind::Timestamp => builder.push_bind(parse_all::<DateTime<Utc>>(field, raws)?),
    };
    Ok(())
}

fn push_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    table: &Table,
    filter: &Filter,
) -> DbResult<()> {
    let column = table
        .column(&filter.field)
        .ok_or_else(|| DbError::UnknownField(filter.field.clone()))?;
    let field = filter.field.as_str();
    let name = column.column;

    match (column.kind, filter.op) {
        (ColumnKind::TextArray, Comparison::Eq) => {
            push_value(builder, column, field, &filter.value)?;
            builder.push(format!(" = ANY({})", name));
        }
        (ColumnKind::TextArray, Comparison::Ne) => {
            builder.push("NOT (");
            push_value(builder, column, field, &filter.value)?;
            builder.push(format!(" = ANY({}))", name));
        }
        (ColumnKind::TextArray, Comparison::In) => {
            builder.push(format!("{} && ", name));
            push_values(builder, column, field, &filter.values())?;
        }
        (_, Comparison::In) => {
            builder.push(format!("{} = ANY(", name));
            push_values(builder, column, field, &filter.values())?;
            builder.push(")");
        }
        (_, Comparison::Eq) => {
            builder.push(format!("{} = ", name));
            push_value(builder, column, field, &filter.value)?;
        }
        // Matches rows where the column is NULL as well.
        (_, Comparison::Ne) => {
            builder.push(format!("{} IS DISTINCT FROM ", name));
            push_value(builder, column, field, &filter.value)?;
        }
        (ColumnKind::TextArray | ColumnKind::Bool | ColumnKind::Uuid, op) => {
            return Err(DbError::UnsupportedOperator {
                field: filter.field.clone(),
                op: op.as_str(),
            });
        }
        (_, op) => {
            let symbol = match op {
                Comparison::Gt => ">",
                Comparison::Gte => ">=",
                Comparison::Lt => "<",
                _ => "<=",
            };
            builder.push(format!("{} {} ", name, symbol));
            push_value(builder, column, field, &filter.value)?;
        }
    }
    Ok(())
}

fn push_where(
    builder: &mut QueryBuilder<'_, Postgres>,
    table: &Table,
    filters: &[Filter],
) -> DbResult<()> {
    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_filter(builder, table, filter)?;
    }
    Ok(())
}

/// build_find
///
/// `SELECT .. WHERE .. ORDER BY .. LIMIT .. OFFSET ..` for a list query. Field names
/// are resolved against the table's column map; values are always bound.
pub(crate) fn build_find<'a>(
    table: &Table,
    columns: &str,
    query: &FindQuery,
) -> DbResult<QueryBuilder<'a, Postgres>> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", columns, table.name));
    push_where(&mut builder, table, &query.filters)?;

    builder.push(" ORDER BY ");
    for key in &query.sort {
        let column = table
            .column(&key.field)
            .ok_or_else(|| DbError::UnknownField(key.field.clone()))?;
        builder.push(format!(
            "{} {}, ",
            column.column,
            if key.descending { "DESC" } else { "ASC" }
        ));
    }
    // Stable pages when sort keys tie.
    builder.push("id ASC");

    builder.push(" LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.skip);
    Ok(builder)
}

pub(crate) fn build_count<'a>(
    table: &Table,
    filters: &[Filter],
) -> DbResult<QueryBuilder<'a, Postgres>> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", table.name));
    push_where(&mut builder, table, filters)?;
    Ok(builder)
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| logged("get_user", e))
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| logged("find_user_by_email", e))
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, role, password_hash) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user.name)
        .bind(user.email)
        .bind(user.role.as_str())
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| logged("create_user", e))
    }

    /// update_user
    ///
    /// `COALESCE` keeps the stored value for every field the request leaves out.
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> DbResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   role = COALESCE($4, role)
               WHERE id = $1
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.email)
        .bind(req.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| logged("update_user", e))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| logged("update_password", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> DbResult<bool> {
        self.delete_by_id("delete_user", &schema::USERS, id).await
    }

    async fn find_users(&self, query: &FindQuery) -> DbResult<Vec<User>> {
        self.find("find_users", &schema::USERS, USER_COLUMNS, query)
            .await
    }

    async fn count_users(&self, filters: &[Filter]) -> DbResult<i64> {
        self.count("count_users", &schema::USERS, filters).await
    }

    // --- BOOTCAMPS ---

    async fn get_bootcamp(&self, id: Uuid) -> DbResult<Option<Bootcamp>> {
        sqlx::query_as::<_, Bootcamp>(&format!(
            "SELECT {} FROM bootcamps WHERE id = $1",
            BOOTCAMP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| logged("get_bootcamp", e))
    }

    async fn find_bootcamp_by_owner(&self, user_id: Uuid) -> DbResult<Option<Bootcamp>> {
        sqlx::query_as::<_, Bootcamp>(&format!(
            "SELECT {} FROM bootcamps WHERE user_id = $1 LIMIT 1",
            BOOTCAMP_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| logged("find_bootcamp_by_owner", e))
    }

    async fn create_bootcamp(&self, b: NewBootcamp) -> DbResult<Bootcamp> {
        sqlx::query_as::<_, Bootcamp>(&format!(
            r#"INSERT INTO bootcamps (
                   id, user_id, name, slug, description, website, phone, email, address,
                   latitude, longitude, formatted_address, street, city, state, zipcode, country,
                   careers, housing, job_assistance, job_guarantee, accept_gi
               ) VALUES (
                   $1, $2, $3, $4, $5, $6, $7, $8, $9,
                   $10, $11, $12, $13, $14, $15, $16, $17,
                   $18, $19, $20, $21, $22
               )
               RETURNING {}"#,
            BOOTCAMP_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(b.user_id)
        .bind(b.name)
        .bind(b.slug)
        .bind(b.description)
        .bind(b.website)
        .bind(b.phone)
        .bind(b.email)
        .bind(b.address)
        .bind(b.latitude)
        .bind(b.longitude)
        .bind(b.formatted_address)
        .bind(b.street)
        .bind(b.city)
        .bind(b.state)
        .bind(b.zipcode)
        .bind(b.country)
        .bind(b.careers)
        .bind(b.housing)
        .bind(b.job_assistance)
        .bind(b.job_guarantee)
        .bind(b.accept_gi)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| logged("create_bootcamp", e))
    }

    /// update_bootcamp
    ///
    /// Partial update via `COALESCE`. A new name also regenerates the slug.
    async fn update_bootcamp(
        &self,
        id: Uuid,
        req: UpdateBootcampRequest,
    ) -> DbResult<Option<Bootcamp>> {
        let slug = req.name.as_deref().map(slugify);
        sqlx::query_as::<_, Bootcamp>(&format!(
            r#"UPDATE bootcamps
               SET name = COALESCE($2, name),
                   slug = COALESCE($3, slug),
                   description = COALESCE($4, description),
                   website = COALESCE($5, website),
                   phone = COALESCE($6, phone),
                   email = COALESCE($7, email),
                   careers = COALESCE($8, careers),
                   housing = COALESCE($9, housing),
                   job_assistance = COALESCE($10, job_assistance),
                   job_guarantee = COALESCE($11, job_guarantee),
                   accept_gi = COALESCE($12, accept_gi)
               WHERE id = $1
               RETURNING {}"#,
            BOOTCAMP_COLUMNS
        ))
        .bind(id)
        .bind(req.name)
        .bind(slug)
        .bind(req.description)
        .bind(req.website)
        .bind(req.phone)
        .bind(req.email)
        .bind(req.careers)
        .bind(req.housing)
        .bind(req.job_assistance)
        .bind(req.job_guarantee)
        .bind(req.accept_gi)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| logged("update_bootcamp", e))
    }

    async fn delete_bootcamp(&self, id: Uuid) -> DbResult<bool> {
        // courses and reviews go with it (ON DELETE CASCADE).
        self.delete_by_id("delete_bootcamp", &schema::BOOTCAMPS, id)
            .await
    }

    async fn set_bootcamp_photo(&self, id: Uuid, photo: &str) -> DbResult<Option<Bootcamp>> {
        sqlx::query_as::<_, Bootcamp>(&format!(
            "UPDATE bootcamps SET photo = $2 WHERE id = $1 RETURNING {}",
            BOOTCAMP_COLUMNS
        ))
        .bind(id)
        .bind(photo)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| logged("set_bootcamp_photo", e))
    }

    /// bootcamps_within_radius
    ///
    /// Spherical law of cosines; the argument of `acos` is clamped to [-1, 1] so
    /// rounding on identical points cannot produce NaN.
    async fn bootcamps_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> DbResult<Vec<Bootcamp>> {
        sqlx::query_as::<_, Bootcamp>(&format!(
            r#"SELECT {} FROM bootcamps
               WHERE latitude IS NOT NULL AND longitude IS NOT NULL
                 AND acos(LEAST(1.0, GREATEST(-1.0,
                       sin(radians($1)) * sin(radians(latitude))
                     + cos(radians($1)) * cos(radians(latitude)) * cos(radians(longitude) - radians($2))
                     ))) <= $3
               ORDER BY created_at DESC, id ASC"#,
            BOOTCAMP_COLUMNS
        ))
        .bind(latitude)
        .bind(longitude)
        .bind(radius)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| logged("bootcamps_within_radius", e))
    }

    async fn find_bootcamps(&self, query: &FindQuery) -> DbResult<Vec<Bootcamp>> {
        self.find("find_bootcamps", &schema::BOOTCAMPS, BOOTCAMP_COLUMNS, query)
            .await
    }

    async fn count_bootcamps(&self, filters: &[Filter]) -> DbResult<i64> {
        self.count("count_bootcamps", &schema::BOOTCAMPS, filters)
            .await
    }

    async fn bootcamp_summaries(&self, ids: &[Uuid]) -> DbResult<Vec<BootcampSummary>> {
        sqlx::query_as::<_, BootcampSummary>(
            "SELECT id, name, description FROM bootcamps WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| logged("bootcamp_summaries", e))
    }

    // --- COURSES ---

    async fn get_course(&self, id: Uuid) -> DbResult<Option<Course>> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = $1",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| logged("get_course", e))
    }

    async fn create_course(&self, c: NewCourse) -> DbResult<Course> {
        let mut tx = self.pool.begin().await.map_err(|e| logged("create_course", e))?;
        let course = sqlx::query_as::<_, Course>(&format!(
            r#"INSERT INTO courses (
                   id, bootcamp_id, user_id, title, description, weeks, tuition,
                   minimum_skill, scholarship_available
               ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {}"#,
            COURSE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(c.bootcamp_id)
        .bind(c.user_id)
        .bind(c.title)
        .bind(c.description)
        .bind(c.weeks)
        .bind(c.tuition)
        .bind(c.minimum_skill)
        .bind(c.scholarship_available)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| logged("create_course", e))?;

        Self::refresh_average_cost(&mut *tx, course.bootcamp_id).await?;
        tx.commit().await.map_err(|e| logged("create_course", e))?;
        Ok(course)
    }

    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> DbResult<Option<Course>> {
        let mut tx = self.pool.begin().await.map_err(|e| logged("update_course", e))?;
        let course = sqlx::query_as::<_, Course>(&format!(
            r#"UPDATE courses
               SET title = COALESCE($2, title),
                   description = COALESCE($3, description),
                   weeks = COALESCE($4, weeks),
                   tuition = COALESCE($5, tuition),
                   minimum_skill = COALESCE($6, minimum_skill),
                   scholarship_available = COALESCE($7, scholarship_available)
               WHERE id = $1
               RETURNING {}"#,
            COURSE_COLUMNS
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.weeks)
        .bind(req.tuition)
        .bind(req.minimum_skill)
        .bind(req.scholarship_available)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| logged("update_course", e))?;

        if let Some(course) = &course {
            Self::refresh_average_cost(&mut *tx, course.bootcamp_id).await?;
        }
        tx.commit().await.map_err(|e| logged("update_course", e))?;
        Ok(course)
    }

    async fn delete_course(&self, id: Uuid) -> DbResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| logged("delete_course", e))?;
        let bootcamp_id: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM courses WHERE id = $1 RETURNING bootcamp_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| logged("delete_course", e))?;

        if let Some(bootcamp_id) = bootcamp_id {
            Self::refresh_average_cost(&mut *tx, bootcamp_id).await?;
        }
        tx.commit().await.map_err(|e| logged("delete_course", e))?;
        Ok(bootcamp_id.is_some())
    }

    async fn find_courses(&self, query: &FindQuery) -> DbResult<Vec<Course>> {
        self.find("find_courses", &schema::COURSES, COURSE_COLUMNS, query)
            .await
    }

    async fn count_courses(&self, filters: &[Filter]) -> DbResult<i64> {
        self.count("count_courses", &schema::COURSES, filters).await
    }

    async fn courses_for_bootcamps(&self, bootcamp_ids: &[Uuid]) -> DbResult<Vec<Course>> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE bootcamp_id = ANY($1) ORDER BY created_at ASC, id ASC",
            COURSE_COLUMNS
        ))
        .bind(bootcamp_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| logged("courses_for_bootcamps", e))
    }

    // --- REVIEWS ---

    async fn get_review(&self, id: Uuid) -> DbResult<Option<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {} FROM reviews WHERE id = $1",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| logged("get_review", e))
    }

    async fn create_review(&self, r: NewReview) -> DbResult<Review> {
        let mut tx = self.pool.begin().await.map_err(|e| logged("create_review", e))?;
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"INSERT INTO reviews (id, bootcamp_id, user_id, title, text, rating)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {}"#,
            REVIEW_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(r.bootcamp_id)
        .bind(r.user_id)
        .bind(r.title)
        .bind(r.text)
        .bind(r.rating)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| logged("create_review", e))?;

        Self::refresh_average_rating(&mut *tx, review.bootcamp_id).await?;
        tx.commit().await.map_err(|e| logged("create_review", e))?;
        Ok(review)
    }

    async fn update_review(&self, id: Uuid, req: UpdateReviewRequest) -> DbResult<Option<Review>> {
        let mut tx = self.pool.begin().await.map_err(|e| logged("update_review", e))?;
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"UPDATE reviews
               SET title = COALESCE($2, title),
                   text = COALESCE($3, text),
                   rating = COALESCE($4, rating)
               WHERE id = $1
               RETURNING {}"#,
            REVIEW_COLUMNS
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.text)
        .bind(req.rating)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| logged("update_review", e))?;

        if let Some(review) = &review {
            Self::refresh_average_rating(&mut *tx, review.bootcamp_id).await?;
        }
        tx.commit().await.map_err(|e| logged("update_review", e))?;
        Ok(review)
    }

    async fn delete_review(&self, id: Uuid) -> DbResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| logged("delete_review", e))?;
        let bootcamp_id: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM reviews WHERE id = $1 RETURNING bootcamp_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| logged("delete_review", e))?;

        if let Some(bootcamp_id) = bootcamp_id {
            Self::refresh_average_rating(&mut *tx, bootcamp_id).await?;
        }
        tx.commit().await.map_err(|e| logged("delete_review", e))?;
        Ok(bootcamp_id.is_some())
    }

    async fn find_reviews(&self, query: &FindQuery) -> DbResult<Vec<Review>> {
        self.find("find_reviews", &schema::REVIEWS, REVIEW_COLUMNS, query)
            .await
    }

    async fn count_reviews(&self, filters: &[Filter]) -> DbResult<i64> {
        self.count("count_reviews", &schema::REVIEWS, filters).await
    }
}
