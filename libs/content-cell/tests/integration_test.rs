use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use tower::ServiceExt;
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use content_cell::router::{notice_routes, popup_routes, price_routes};
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn notice_row(id: &str, title: &str, is_pinned: bool, view_count: i64) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "content": "Clinic closes early on Friday.",
        "is_pinned": is_pinned,
        "view_count": view_count,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn popup_row(title: &str, starts_at: Option<String>, ends_at: Option<String>) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "title": title,
        "content": null,
        "image_url": null,
        "link_url": null,
        "is_active": true,
        "starts_at": starts_at,
        "ends_at": ends_at,
        "sort_order": 0,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn price_row(category: &str, name: &str, price: i64) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "category": category,
        "name": name,
        "price": price,
        "description": null,
        "sort_order": 0,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn admin_token(secret: &str) -> String {
    JwtTestUtils::create_test_token(&TestUser::admin("admin@example.com"), secret, Some(1))
}

#[tokio::test]
async fn test_list_notices_pinned_first() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/notices"))
        .and(query_param("order", "is_pinned.desc,created_at.desc"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            notice_row(&Uuid::new_v4().to_string(), "Holiday schedule", true, 10),
            notice_row(&Uuid::new_v4().to_string(), "New equipment", false, 3),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = notice_routes(Arc::new(config)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_response = body_json(response).await;
    assert_eq!(json_response["total"], 2);
    assert_eq!(json_response["notices"][0]["is_pinned"], true);
}

#[tokio::test]
async fn test_get_notice_counts_view() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let notice_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/notices"))
        .and(query_param("id", format!("eq.{}", notice_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            notice_row(&notice_id, "Holiday schedule", false, 4)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/increment_notice_view_count"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder().uri(format!("/{}", notice_id)).body(Body::empty()).unwrap();
    let response = notice_routes(Arc::new(config)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["view_count"], 5);
}

#[tokio::test]
async fn test_get_notice_survives_counter_failure() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let notice_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/notices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            notice_row(&notice_id, "Holiday schedule", false, 4)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/increment_notice_view_count"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let request = Request::builder().uri(format!("/{}", notice_id)).body(Body::empty()).unwrap();
    let response = notice_routes(Arc::new(config)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["view_count"], 4);
}

#[tokio::test]
async fn test_create_notice_requires_admin() {
    let config = TestConfig::default().to_app_config();
    let token = JwtTestUtils::create_test_token(
        &TestUser::patient("patient@example.com"),
        &config.supabase_jwt_secret,
        Some(1),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "title": "t", "content": "c" }).to_string()))
        .unwrap();

    let response = notice_routes(Arc::new(config)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_active_popups_respect_window() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path("/rest/v1/popups"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            popup_row("Always", None, None),
            popup_row("Running", Some((now - Duration::days(1)).to_rfc3339()), Some((now + Duration::days(1)).to_rfc3339())),
            popup_row("Expired", None, Some((now - Duration::days(1)).to_rfc3339())),
            popup_row("Upcoming", Some((now + Duration::days(1)).to_rfc3339()), None),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder().uri("/active").body(Body::empty()).unwrap();
    let response = popup_routes(Arc::new(config)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let popups = body_json(response).await["popups"].as_array().unwrap().clone();
    let titles: Vec<&str> = popups.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Always", "Running"]);
}

#[tokio::test]
async fn test_create_popup_inverted_window_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let token = admin_token(&config.supabase_jwt_secret);
    let now = Utc::now();

    Mock::given(method("POST"))
        .and(path("/rest/v1/popups"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({
            "title": "Summer event",
            "starts_at": (now + Duration::days(7)).to_rfc3339(),
            "ends_at": now.to_rfc3339()
        }).to_string()))
        .unwrap();

    let response = popup_routes(Arc::new(config)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_popup_with_equal_bounds_accepted() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let token = admin_token(&config.supabase_jwt_secret);
    let instant = Utc::now().to_rfc3339();

    Mock::given(method("POST"))
        .and(path("/rest/v1/popups"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            popup_row("Flash notice", Some(instant.clone()), Some(instant.clone()))
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({
            "title": "Flash notice",
            "starts_at": instant,
            "ends_at": instant
        }).to_string()))
        .unwrap();

    let response = popup_routes(Arc::new(config)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_prices_grouped_by_category() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/price_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            price_row("Checkup", "Basic", 50_000),
            price_row("Checkup", "Premium", 150_000),
            price_row("Vaccination", "Influenza", 30_000),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = price_routes(Arc::new(config)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_response = body_json(response).await;
    assert_eq!(json_response["categories"][0]["category"], "Checkup");
    assert_eq!(json_response["categories"][0]["items"].as_array().unwrap().len(), 2);
    assert_eq!(json_response["categories"][1]["items"][0]["price"], 30_000);
}

#[tokio::test]
async fn test_negative_price_rejected() {
    let config = TestConfig::default().to_app_config();
    let token = admin_token(&config.supabase_jwt_secret);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({
            "category": "Checkup",
            "name": "Basic",
            "price": -100
        }).to_string()))
        .unwrap();

    let response = price_routes(Arc::new(config)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_missing_price_item() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let token = admin_token(&config.supabase_jwt_secret);

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/price_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = price_routes(Arc::new(config)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
