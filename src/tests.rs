//! Router-level tests. The state's pool points at a closed port, so anything
//! that reaches the database fails with a connectivity error.

use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{app::build_app, auth::jwt::JwtKeys, state::AppState};

fn app() -> (Router, JwtKeys) {
    let state = AppState::fake();
    let keys = JwtKeys::from_ref(&state);
    (build_app(state), keys)
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

#[tokio::test]
async fn root_welcomes_and_reports_process_time() {
    let (app, _) = app();
    let (status, headers, body) = send(app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the NutriTrack API");
    assert!(headers.contains_key("x-process-time"));
}

#[tokio::test]
async fn health_is_degraded_when_database_is_down() {
    let (app, _) = app();
    let (status, _, body) = send(app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unreachable");
}

#[tokio::test]
async fn protected_routes_require_access_token() {
    let (app, keys) = app();

    let (status, _, body) = send(app.clone(), Method::GET, "/foods", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());

    let (status, _, _) = send(app.clone(), Method::GET, "/dashboard", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh = keys.sign_refresh(Uuid::new_v4()).unwrap();
    let (status, _, body) = send(app, Method::GET, "/meals", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Access token required");
}

#[tokio::test]
async fn register_validates_before_touching_the_database() {
    let (app, _) = app();

    let (status, _, body) = send(
        app.clone(),
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": "ana@example.com", "full_name": "Ana", "password": "12345"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("at least 6"));

    let (status, _, _) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": "not-an-email", "full_name": "Ana", "password": "123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_meal_is_rejected_with_400() {
    let (app, keys) = app();
    let token = keys.sign_access(Uuid::new_v4()).unwrap();

    let (status, _, body) = send(
        app,
        Method::POST,
        "/meals",
        Some(&token),
        Some(json!({
            "name": "Brunch",
            "meal_type": "brunch",
            "date": "2024-05-01",
            "items": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("meal_type"));
}

#[tokio::test]
async fn reversed_meal_plan_is_rejected_with_400() {
    let (app, keys) = app();
    let token = keys.sign_access(Uuid::new_v4()).unwrap();

    let (status, _, _) = send(
        app,
        Method::POST,
        "/meal-plans",
        Some(&token),
        Some(json!({"name": "Week", "start_date": "2024-05-08", "end_date": "2024-05-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn foreign_profile_is_404() {
    let (app, keys) = app();
    let token = keys.sign_access(Uuid::new_v4()).unwrap();
    let uri = format!("/users/{}", Uuid::new_v4());
    let (status, _, _) = send(app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn database_outage_surfaces_as_generic_503() {
    let (app, keys) = app();
    let token = keys.sign_access(Uuid::new_v4()).unwrap();

    let (status, _, body) = send(
        app,
        Method::POST,
        "/foods",
        Some(&token),
        Some(json!({
            "name": "Oatmeal",
            "calories": 150.0,
            "protein": 5.0,
            "carbs": 27.0,
            "fat": 3.0,
            "serving_size": 1.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Service temporarily unavailable");
}

#[tokio::test]
async fn malformed_input_is_a_400_with_detail() {
    let (app, keys) = app();
    let token = keys.sign_access(Uuid::new_v4()).unwrap();

    let (status, headers, body) = send(
        app.clone(),
        Method::POST,
        "/foods",
        Some(&token),
        Some(json!({"name": "Oatmeal", "protein": 5.0, "carbs": 27.0, "fat": 3.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(body["detail"].as_str().unwrap().contains("calories"));

    let (status, _, body) = send(
        app.clone(),
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": "ana@example.com", "password": "123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("full_name"));

    let (status, _, body) =
        send(app.clone(), Method::GET, "/meals/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, _, body) =
        send(app, Method::GET, "/meals?limit=lots", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}
