use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header, query_param};

use doctor_cell::router::{department_routes, doctor_routes};
use shared_config::AppConfig;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils, MockSupabaseResponses};

fn doctor_app(config: AppConfig) -> Router {
    doctor_routes(Arc::new(config))
}

fn department_app(config: AppConfig) -> Router {
    department_routes(Arc::new(config))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_list_doctors_public_filters_by_department() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let department_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("is_active", "eq.true"))
        .and(query_param("department_id", format!("eq.{}", department_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(&Uuid::new_v4().to_string(), &department_id, "Dr. Kim"),
            MockSupabaseResponses::doctor_response(&Uuid::new_v4().to_string(), &department_id, "Dr. Lee"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .uri(format!("/?department_id={}", department_id))
        .body(Body::empty())
        .unwrap();

    let response = doctor_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["total"], 2);
    assert_eq!(json_response["doctors"][0]["name"], "Dr. Kim");
}

#[tokio::test]
async fn test_get_inactive_doctor_public_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let doctor_id = Uuid::new_v4().to_string();

    let mut doctor = MockSupabaseResponses::doctor_response(&doctor_id, &Uuid::new_v4().to_string(), "Dr. Park");
    doctor["is_active"] = json!(false);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .uri(format!("/{}", doctor_id))
        .body(Body::empty())
        .unwrap();

    let response = doctor_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_doctor_invalid_id() {
    let config = TestConfig::default().to_app_config();

    let request = Request::builder().uri("/not-a-uuid").body(Body::empty()).unwrap();
    let response = doctor_app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_doctor_requires_admin() {
    let config = TestConfig::default().to_app_config();
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({
            "department_id": Uuid::new_v4(),
            "name": "Dr. Choi"
        }).to_string()))
        .unwrap();

    let response = doctor_app(config.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = doctor_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_creates_doctor() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.supabase_jwt_secret, Some(1));
    let department_id = Uuid::new_v4().to_string();
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .and(query_param("id", format!("eq.{}", department_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::department_response(&department_id, "Orthopedics")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
        .and(header("Authorization", format!("Bearer {}", token)))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::doctor_response(&doctor_id, &department_id, "Dr. Choi")
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
            "department_id": department_id,
            "name": "  Dr. Choi  ",
            "position": "Director"
        }).to_string()))
        .unwrap();

    let response = doctor_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["id"], doctor_id);
    assert_eq!(json_response["department_id"], department_id);
}

#[tokio::test]
async fn test_admin_create_doctor_unknown_department() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.supabase_jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
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
            "department_id": Uuid::new_v4(),
            "name": "Dr. Choi"
        }).to_string()))
        .unwrap();

    let response = doctor_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_lists_inactive_doctors() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.supabase_jwt_secret, Some(1));

    let mut inactive = MockSupabaseResponses::doctor_response(
        &Uuid::new_v4().to_string(),
        &Uuid::new_v4().to_string(),
        "Dr. Retired",
    );
    inactive["is_active"] = json!(false);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(header("Authorization", format!("Bearer {}", token)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([inactive])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .uri("/admin/all")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = doctor_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["doctors"][0]["is_active"], false);
}

#[tokio::test]
async fn test_delete_doctor_with_reservations_conflicts() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());
    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.supabase_jwt_secret, Some(1));
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(&doctor_id, &Uuid::new_v4().to_string(), "Dr. Han")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response("violates foreign key constraint", "23503"),
        ))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", doctor_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = doctor_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_departments_public() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_mock_server(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .and(query_param("is_active", "eq.true"))
        .and(query_param("order", "sort_order.asc,name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::department_response(&Uuid::new_v4().to_string(), "Internal Medicine"),
            MockSupabaseResponses::department_response(&Uuid::new_v4().to_string(), "Pediatrics"),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = department_app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_response = body_json(response).await;
    assert_eq!(json_response["total"], 2);
    assert_eq!(json_response["departments"][1]["name"], "Pediatrics");
}

#[tokio::test]
async fn test_update_department_blank_name_rejected() {
    let config = TestConfig::default().to_app_config();
    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.supabase_jwt_secret, Some(1));

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "   " }).to_string()))
        .unwrap();

    let response = department_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
