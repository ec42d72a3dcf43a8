use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{UpdateProfileRequest, UpdateRoleRequest, UserSearchQuery};
use crate::services::ProfileService;

fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid user ID format".to_string()))
}

#[axum::debug_handler]
pub async fn get_my_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let profile = service.get_or_create_own(&user, auth.token()).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_my_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    // Ensure the row exists before patching it.
    service.get_or_create_own(&user, auth.token()).await?;
    let profile = service.update_own(&user, request, auth.token()).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn search_users(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let users = service.search_users(query, auth.token()).await?;

    Ok(Json(json!({
        "users": users,
        "total": users.len()
    })))
}

#[axum::debug_handler]
pub async fn get_user(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let profile = service.get_profile(parse_user_id(&user_id)?, auth.token()).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_user_role(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let profile = service
        .update_role(parse_user_id(&user_id)?, &request.role, &admin, auth.token())
        .await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    service.delete_user(parse_user_id(&user_id)?, &admin, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted"
    })))
}
