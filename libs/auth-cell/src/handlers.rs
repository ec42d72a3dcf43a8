use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::HeaderMap,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::bearer_from_headers;
use shared_utils::jwt::validate_token as validate_jwt;

/// What the booking pages need to know about the signed-in visitor.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub role: String,
    pub is_admin: bool,
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_from_headers(&headers)?;
    let user = validate_jwt(token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_from_headers(&headers)?;
    let valid = validate_jwt(token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

pub async fn get_session(
    Extension(user): Extension<User>,
) -> Result<Json<SessionResponse>, AppError> {
    debug!("Describing session for user: {}", user.id);

    Ok(Json(SessionResponse {
        is_admin: user.is_admin(),
        name: user.display_name(),
        role: user.role.clone().unwrap_or_else(|| "user".to_string()),
        user_id: user.id,
        email: user.email,
        phone: user.phone,
    }))
}
