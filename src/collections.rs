//! [`Collection`] handles over the repository, one per listable resource.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Bootcamp, Course, Review, User},
    query::{Collection, FindQuery, Filter, Relation},
    repository::RepositoryState,
};

pub struct Bootcamps(pub RepositoryState);
pub struct Courses(pub RepositoryState);
pub struct Reviews(pub RepositoryState);
pub struct Users(pub RepositoryState);

fn id_of(item: &Value, key: &str) -> Option<Uuid> {
    item.get(key)?.as_str()?.parse().ok()
}

/// Replaces the `bootcamp` id of each item with the bootcamp's summary. Items whose
/// bootcamp no longer exists keep the bare id.
async fn embed_bootcamps(repo: &RepositoryState, items: Vec<Value>) -> Result<Vec<Value>, AppError> {
    let mut ids: Vec<Uuid> = items.iter().filter_map(|i| id_of(i, "bootcamp")).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(items);
    }

    let summaries: HashMap<Uuid, Value> = repo
        .bootcamp_summaries(&ids)
        .await?
        .into_iter()
        .map(|s| {
            let id = s.id;
            serde_json::to_value(s).map(|v| (id, v))
        })
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(items
        .into_iter()
        .map(|mut item| {
            if let Some(summary) = id_of(&item, "bootcamp").and_then(|id| summaries.get(&id)) {
                item["bootcamp"] = summary.clone();
            }
            item
        })
        .collect())
}

#[async_trait]
impl Collection for Bootcamps {
    type Item = Bootcamp;

    async fn count(&self, filters: &[Filter]) -> Result<i64, AppError> {
        Ok(self.0.count_bootcamps(filters).await?)
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Bootcamp>, AppError> {
        Ok(self.0.find_bootcamps(query).await?)
    }

    async fn expand(&self, items: Vec<Value>, relation: Relation) -> Result<Vec<Value>, AppError> {
        if relation != Relation::Courses {
            return Ok(items);
        }

        let ids: Vec<Uuid> = items.iter().filter_map(|i| id_of(i, "id")).collect();
        let mut by_bootcamp: HashMap<Uuid, Vec<Value>> = HashMap::new();
        for course in self.0.courses_for_bootcamps(&ids).await? {
            let bootcamp_id = course.bootcamp_id;
            let value = serde_json::to_value(course).map_err(|e| AppError::Internal(e.into()))?;
            by_bootcamp.entry(bootcamp_id).or_default().push(value);
        }

        Ok(items
            .into_iter()
            .map(|mut item| {
                let courses = id_of(&item, "id")
                    .and_then(|id| by_bootcamp.remove(&id))
                    .unwrap_or_default();
                if let Value::Object(map) = &mut item {
                    map.insert("courses".to_string(), Value::Array(courses));
                }
                item
            })
            .collect())
    }
}

#[async_trait]
impl Collection for Courses {
    type Item = Course;

    async fn count(&self, filters: &[Filter]) -> Result<i64, AppError> {
        Ok(self.0.count_courses(filters).await?)
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Course>, AppError> {
        Ok(self.0.find_courses(query).await?)
    }

    async fn expand(&self, items: Vec<Value>, relation: Relation) -> Result<Vec<Value>, AppError> {
        match relation {
            Relation::Bootcamp => embed_bootcamps(&self.0, items).await,
            Relation::Courses => Ok(items),
        }
    }
}

#[async_trait]
impl Collection for Reviews {
    type Item = Review;

    async fn count(&self, filters: &[Filter]) -> Result<i64, AppError> {
        Ok(self.0.count_reviews(filters).await?)
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Review>, AppError> {
        Ok(self.0.find_reviews(query).await?)
    }

    async fn expand(&self, items: Vec<Value>, relation: Relation) -> Result<Vec<Value>, AppError> {
        match relation {
            Relation::Bootcamp => embed_bootcamps(&self.0, items).await,
            Relation::Courses => Ok(items),
        }
    }
}

#[async_trait]
impl Collection for Users {
    type Item = User;

    async fn count(&self, filters: &[Filter]) -> Result<i64, AppError> {
        Ok(self.0.count_users(filters).await?)
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<User>, AppError> {
        Ok(self.0.find_users(query).await?)
    }
}
