//! Router tests that never reach the database: public routes, auth
//! rejections, and validation that runs before any query.

mod common;

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, AUTHORIZATION,
    CONTENT_DISPOSITION, CONTENT_TYPE, ORIGIN,
};
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use common::{body_json, body_text, build_test_app, lazy_pool, send, token_for};

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn template_is_served_as_csv_attachment() {
    let app = build_test_app(lazy_pool());
    let response = send(app, get("/api/v1/student-and-parent/template", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(response.headers()[CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment"));

    let body = body_text(response).await;
    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some(concat!(
            "name,grade,grade_label,gender,telephone,",
            "parent_name,parent_gender,parent_telephone,parent_email,nsn"
        ))
    );
    assert!(lines.next().is_some());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = build_test_app(lazy_pool());
    let response = send(app, get("/api/v1/student-and-parent/template", None)).await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn cors_exposes_download_and_request_id_headers() {
    let app = build_test_app(lazy_pool());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/student-and-parent/template")
        .header(ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(
        response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    let exposed = response.headers()[ACCESS_CONTROL_EXPOSE_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("content-disposition"));
    assert!(exposed.contains("x-request-id"));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = build_test_app(lazy_pool());
    let response = send(app, get("/api/v1/student", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = build_test_app(lazy_pool());
    let response = send(app, get("/api/v1/student", Some("not-a-jwt"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn teacher_cannot_reach_admin_routes() {
    let app = build_test_app(lazy_pool());
    let token = token_for(7, "teacher");
    let response = send(app, get("/api/v1/staff", Some(&token))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn empty_dispatch_is_a_bad_request() {
    let app = build_test_app(lazy_pool());
    let token = token_for(7, "teacher");
    let response = send(
        app,
        post_json(
            "/api/v1/notification/attendance",
            Some(&token),
            json!({ "subject_id": 1, "student_ids": [] }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn empty_data_change_request_is_rejected() {
    let app = build_test_app(lazy_pool());
    let response = send(
        app,
        post_json(
            "/api/v1/student-and-parent/data-change-requests",
            None,
            json!({ "old_telephone": "081200000001", "new_name": "   " }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("At least one field"));
}

#[tokio::test]
async fn out_of_range_scores_list_every_problem() {
    let app = build_test_app(lazy_pool());
    let token = token_for(7, "teacher");
    let response = send(
        app,
        post_json(
            "/api/v1/student/test-scores",
            Some(&token),
            json!({
                "subject_id": 1,
                "scores": [
                    { "student_id": 1, "score": 120 },
                    { "student_id": 2, "score": -5 }
                ]
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn sender_status_reports_disabled_channels() {
    let app = build_test_app(lazy_pool());
    let token = token_for(7, "teacher");
    let response = send(app, get("/api/v1/sender", Some(&token))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["email"]["enabled"], false);
    assert_eq!(json["data"]["whatsapp"]["enabled"], false);
    assert_eq!(json["data"]["locale"], "id");
}

#[tokio::test]
async fn test_email_without_smtp_is_a_bad_request() {
    let app = build_test_app(lazy_pool());
    let token = token_for(1, "admin");
    let response = send(
        app,
        post_json(
            "/api/v1/sender/test-email",
            Some(&token),
            json!({ "to": "admin@school.test" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("not configured"));
}
