mod common;

use axum::http::StatusCode;
use common::TestApp;
use devcamper_api::{
    models::{Role, UpdateBootcampRequest},
    repository::Repository,
};
use serde_json::{Value, json};

fn names(body: &Value) -> Vec<&str> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect()
}

async fn seed_five(app: &TestApp) {
    let (admin, _) = app.user(Role::Admin).await;
    for name in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"] {
        app.bootcamp(&admin, name).await;
    }
}

#[tokio::test]
async fn test_select_sort_and_page_together() {
    let app = TestApp::new();
    seed_five(&app).await;

    let response = app
        .get("/api/v1/bootcamps?select=name,description&sort=-name&page=2&limit=2")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = &response.body;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(names(body), vec!["Charlie", "Bravo"]);
    assert_eq!(body["pagination"]["next"], json!({ "page": 3, "limit": 2 }));
    assert_eq!(body["pagination"]["prev"], json!({ "page": 1, "limit": 2 }));

    let first = &body["data"][0];
    assert!(first.get("id").is_some());
    assert_eq!(first["description"], "Charlie description");
    assert!(first.get("housing").is_none());
    assert!(first.get("slug").is_none());
}

#[tokio::test]
async fn test_first_and_last_pages_omit_links() {
    let app = TestApp::new();
    seed_five(&app).await;

    let first = app.get("/api/v1/bootcamps?sort=name&limit=2").await;
    assert!(first.body["pagination"].get("prev").is_none());
    assert_eq!(first.body["pagination"]["next"]["page"], 2);

    let last = app.get("/api/v1/bootcamps?sort=name&limit=2&page=3").await;
    assert_eq!(names(&last.body), vec!["Echo"]);
    assert!(last.body["pagination"].get("next").is_none());
    assert_eq!(last.body["pagination"]["prev"]["page"], 2);

    let beyond = app.get("/api/v1/bootcamps?limit=2&page=9").await;
    assert_eq!(beyond.body["count"], 0);
    assert!(beyond.body["pagination"].get("next").is_none());
}

#[tokio::test]
async fn test_pagination_counts_only_matching_documents() {
    let app = TestApp::new();
    seed_five(&app).await;
    let (admin, _) = app.user(Role::Admin).await;
    let housed = app.bootcamp(&admin, "Foxtrot").await;
    app.repo
        .update_bootcamp(
            housed.id,
            UpdateBootcampRequest {
                housing: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app.get("/api/v1/bootcamps?housing=true&limit=1").await;
    assert_eq!(names(&response.body), vec!["Foxtrot"]);
    assert!(response.body["pagination"].get("next").is_none());
}

#[tokio::test]
async fn test_comparison_operators_filter_numeric_fields() {
    let app = TestApp::new();
    let (admin, _) = app.user(Role::Admin).await;
    let cheap = app.bootcamp(&admin, "Cheap").await;
    let pricey = app.bootcamp(&admin, "Pricey").await;
    app.course(&cheap, "Basics", 8000.0).await;
    app.course(&pricey, "Deep Dive", 12000.0).await;
    app.course(&pricey, "Capstone", 13000.0).await;

    let lte = app.get("/api/v1/bootcamps?averageCost[lte]=10000").await;
    assert_eq!(names(&lte.body), vec!["Cheap"]);

    let gt = app.get("/api/v1/bootcamps?averageCost[gt]=10000").await;
    assert_eq!(names(&gt.body), vec!["Pricey"]);
    assert_eq!(gt.body["data"][0]["averageCost"], 12500.0);
}

#[tokio::test]
async fn test_in_operator_matches_any_career() {
    let app = TestApp::new();
    let (admin, _) = app.user(Role::Admin).await;
    let web = app.bootcamp(&admin, "Web Only").await;
    let biz = app.bootcamp(&admin, "Business School").await;
    app.repo
        .update_bootcamp(
            biz.id,
            UpdateBootcampRequest {
                careers: Some(vec!["Business".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app
        .get("/api/v1/bootcamps?careers[in]=Business,Other&sort=name")
        .await;
    assert_eq!(names(&response.body), vec!["Business School"]);

    let both = app
        .get("/api/v1/bootcamps?careers[in]=Business,Web%20Development&sort=name")
        .await;
    assert_eq!(both.body["count"], 2);
    assert_eq!(names(&both.body), vec!["Business School", web.name.as_str()]);
}

#[tokio::test]
async fn test_unknown_filter_field_is_a_bad_request() {
    let app = TestApp::new();
    let response = app.get("/api/v1/bootcamps?password=x").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid query field: password");
}

#[tokio::test]
async fn test_unknown_sort_field_is_a_bad_request() {
    let app = TestApp::new();
    let response = app.get("/api/v1/bootcamps?sort=-secret").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unrecognized_operator_is_a_bad_request() {
    let app = TestApp::new();
    let response = app.get("/api/v1/bootcamps?averageCost[regex]=1").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_uncastable_filter_value_is_not_found() {
    let app = TestApp::new();
    let response = app.get("/api/v1/bootcamps?averageCost[lte]=cheap").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Resource not found");
}

#[tokio::test]
async fn test_bootcamp_list_embeds_courses() {
    let app = TestApp::new();
    let (admin, _) = app.user(Role::Admin).await;
    let bootcamp = app.bootcamp(&admin, "With Courses").await;
    app.bootcamp(&admin, "Without Courses").await;
    app.course(&bootcamp, "Front End", 5000.0).await;

    let response = app.get("/api/v1/bootcamps?sort=name").await;
    let data = response.body["data"].as_array().unwrap();
    assert_eq!(data[0]["courses"].as_array().unwrap().len(), 1);
    assert_eq!(data[0]["courses"][0]["title"], "Front End");
    assert_eq!(data[1]["courses"], json!([]));
}

#[tokio::test]
async fn test_course_list_embeds_bootcamp_summary() {
    let app = TestApp::new();
    let (admin, _) = app.user(Role::Admin).await;
    let bootcamp = app.bootcamp(&admin, "Summary Camp").await;
    app.course(&bootcamp, "Back End", 5000.0).await;

    let response = app.get("/api/v1/courses").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"][0]["bootcamp"],
        json!({
            "id": bootcamp.id,
            "name": "Summary Camp",
            "description": "Summary Camp description"
        })
    );
}

#[tokio::test]
async fn test_nested_course_list_is_scoped_and_paginated() {
    let app = TestApp::new();
    let (admin, _) = app.user(Role::Admin).await;
    let mine = app.bootcamp(&admin, "Mine").await;
    let other = app.bootcamp(&admin, "Other").await;
    for title in ["One", "Two", "Three"] {
        app.course(&mine, title, 1000.0).await;
    }
    app.course(&other, "Elsewhere", 1000.0).await;

    let response = app
        .get(&format!(
            "/api/v1/bootcamps/{}/courses?sort=title&limit=2&bootcamp={}",
            mine.id, other.id
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 2);
    assert_eq!(response.body["pagination"]["next"]["page"], 2);
    let titles: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["One", "Three"]);
    assert_eq!(response.body["data"][0]["bootcamp"], mine.id.to_string());
}

#[tokio::test]
async fn test_nested_review_list_for_unknown_bootcamp_is_empty() {
    let app = TestApp::new();
    let response = app
        .get(&format!("/api/v1/bootcamps/{}/reviews", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 0);
}

#[tokio::test]
async fn test_huge_page_is_a_bad_request() {
    let app = TestApp::new();
    seed_five(&app).await;

    let response = app
        .get("/api/v1/bootcamps?page=9223372036854775807&limit=2")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "Page is out of range");

    let last_possible = app
        .get("/api/v1/bootcamps?page=9223372036854775807&limit=1")
        .await;
    assert_eq!(last_possible.status, StatusCode::OK);
    assert_eq!(last_possible.body["count"], 0);
    assert!(last_possible.body["pagination"].get("next").is_none());
}
