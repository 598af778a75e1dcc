//! Generic response shaping for list endpoints.
//!
//! A [`QueryDescriptor`] is derived from the raw query string, handed to
//! [`shape`] together with a [`Collection`], and comes back as an
//! [`AdvancedResults`] envelope that the handler returns verbatim.

use async_trait::async_trait;
use axum::{
    Json,
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Query parameters that drive shaping and are never treated as data filters.
pub const RESERVED_PARAMS: [&str; 4] = ["select", "sort", "page", "limit"];

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 25;
pub const DEFAULT_SORT: &str = "-createdAt";

/// Comparison
///
/// Operator attached to a filter, written as `field[op]=value` in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Comparison {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "eq" => Some(Comparison::Eq),
            "ne" => Some(Comparison::Ne),
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            "in" => Some(Comparison::In),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
            Comparison::Gt => "gt",
            Comparison::Gte => "gte",
            Comparison::Lt => "lt",
            Comparison::Lte => "lte",
            Comparison::In => "in",
        }
    }
}

/// Filter
///
/// One data filter. `value` is kept exactly as received; the persistence layer
/// casts it according to the column it targets. For `In` it holds a
/// comma-separated list.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Comparison,
    pub value: String,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: Comparison::Eq,
            value: value.into(),
        }
    }

    /// Values of an `In` filter.
    pub fn values(&self) -> Vec<&str> {
        self.value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    }

    fn parse(key: &str, value: &str) -> Result<Self, AppError> {
        match key.split_once('[') {
            Some((field, rest)) => {
                let op = rest
                    .strip_suffix(']')
                    .and_then(Comparison::parse)
                    .ok_or_else(|| {
                        AppError::bad_request(format!("Unsupported filter operator in `{}`", key))
                    })?;
                Ok(Self {
                    field: field.to_string(),
                    op,
                    value: value.to_string(),
                })
            }
            None => Ok(Self::eq(key, value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(field) => (field, true),
            None => (raw.strip_prefix('+').unwrap_or(raw), false),
        };
        (!field.is_empty()).then(|| Self {
            field: field.to_string(),
            descending,
        })
    }
}

/// FindQuery
///
/// What the persistence layer executes: filter, sort, skip, limit.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortKey>,
    pub skip: i64,
    pub limit: i64,
}

/// QueryDescriptor
///
/// Normalized form of the list-endpoint query string.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub filters: Vec<Filter>,
    pub select: Option<Vec<String>>,
    pub sort: Vec<SortKey>,
    pub page: i64,
    pub limit: i64,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            select: None,
            sort: split_sort(DEFAULT_SORT),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',').filter_map(SortKey::parse).collect()
}

/// Positive integer or the default; zero, negatives and garbage all fall back.
fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

impl QueryDescriptor {
    /// from_params
    ///
    /// Builds the descriptor from raw `(key, value)` pairs in request order.
    pub fn from_params(params: &[(String, String)]) -> Result<Self, AppError> {
        let reserved = |name: &str| {
            params
                .iter()
                .rev()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let filters = params
            .iter()
            .filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()))
            .map(|(k, v)| Filter::parse(k, v))
            .collect::<Result<Vec<_>, _>>()?;

        let select = reserved("select")
            .map(split_list)
            .filter(|fields| !fields.is_empty());

        let sort = match reserved("sort").map(split_sort) {
            Some(keys) if !keys.is_empty() => keys,
            _ => split_sort(DEFAULT_SORT),
        };

        let page = positive_or(reserved("page"), DEFAULT_PAGE);
        let limit = positive_or(reserved("limit"), DEFAULT_LIMIT);
        // Offsets and page links are derived from `page * limit`.
        if page.checked_mul(limit).is_none() {
            return Err(AppError::bad_request("Page is out of range"));
        }

        Ok(Self {
            filters,
            select,
            sort,
            page,
            limit,
        })
    }

    /// Restricts the descriptor to a parent resource, e.g. the courses of one bootcamp.
    pub fn scoped(mut self, field: &str, value: impl ToString) -> Self {
        self.filters.retain(|f| f.field != field);
        self.filters.push(Filter::eq(field, value.to_string()));
        self
    }

    pub fn start_index(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn end_index(&self) -> i64 {
        self.page * self.limit
    }

    pub fn find_query(&self) -> FindQuery {
        FindQuery {
            filters: self.filters.clone(),
            sort: self.sort.clone(),
            skip: self.start_index(),
            limit: self.limit,
        }
    }
}

/// ListQuery
///
/// Extractor turning the raw query string of a list endpoint into a descriptor.
/// Pairs are kept in request order so repeated keys survive.
#[derive(Debug, Clone)]
pub struct ListQuery(pub QueryDescriptor);

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(ListQuery(QueryDescriptor::from_params(&pairs)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

/// Pagination
///
/// `next` is present iff `page * limit < total`; `prev` iff `page > 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn compute(page: i64, limit: i64, total: i64) -> Self {
        let next = (page.saturating_mul(limit) < total).then(|| PageRef {
            page: page + 1,
            limit,
        });
        let prev = (page > 1).then(|| PageRef {
            page: page - 1,
            limit,
        });
        Self { next, prev }
    }
}

/// AdvancedResults
///
/// The shaped list envelope. It is a plain value threaded back to the handler
/// rather than state stashed on the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedResults {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

impl IntoResponse for AdvancedResults {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Relation
///
/// Relations a caller may ask to expand on each returned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Embed the courses of each bootcamp under `courses`.
    Courses,
    /// Replace the `bootcamp` id of each item with `{ id, name, description }`.
    Bootcamp,
}

/// Collection
///
/// A queryable set of resources. Implementations delegate to the persistence
/// layer; errors are propagated unchanged.
#[async_trait]
pub trait Collection: Send + Sync {
    type Item: Serialize + Send;

    /// Number of items matching `filters`.
    async fn count(&self, filters: &[Filter]) -> Result<i64, AppError>;

    async fn find(&self, query: &FindQuery) -> Result<Vec<Self::Item>, AppError>;

    /// Expands `relation` on already-serialized items. Collections that do not
    /// know the relation return the items untouched.
    async fn expand(&self, items: Vec<Value>, relation: Relation) -> Result<Vec<Value>, AppError> {
        tracing::debug!(?relation, "relation not supported by collection, skipping");
        Ok(items)
    }
}

/// project
///
/// Keeps only the selected fields of a serialized item. `id` always survives.
pub fn project(item: Value, select: &[String]) -> Value {
    match item {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| k == "id" || select.iter().any(|s| s == k))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// shape
///
/// Runs the descriptor against the collection and builds the paginated envelope.
pub async fn shape<C>(
    descriptor: &QueryDescriptor,
    collection: &C,
    populate: Option<Relation>,
) -> Result<AdvancedResults, AppError>
where
    C: Collection + ?Sized,
{
    let total = collection.count(&descriptor.filters).await?;
    let items = collection.find(&descriptor.find_query()).await?;

    let mut data = items
        .into_iter()
        .map(|item| serde_json::to_value(item).map_err(|e| AppError::Internal(e.into())))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(select) = &descriptor.select {
        data = data.into_iter().map(|item| project(item, select)).collect();
    }

    if let Some(relation) = populate {
        data = collection.expand(data, relation).await?;
    }

    let pagination = Pagination::compute(descriptor.page, descriptor.limit, total);

    tracing::debug!(
        total,
        page = descriptor.page,
        limit = descriptor.limit,
        returned = data.len(),
        "shaped list query"
    );

    Ok(AdvancedResults {
        success: true,
        count: data.len(),
        pagination,
        data,
    })
}
