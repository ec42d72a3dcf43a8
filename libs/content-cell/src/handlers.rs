use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    CreateNoticeRequest, CreatePopupRequest, CreatePriceItemRequest, NoticeListQuery,
    UpdateNoticeRequest, UpdatePopupRequest, UpdatePriceItemRequest,
};
use crate::services::{NoticeService, PopupService, PriceService};

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid ID format".to_string()))
}

fn deleted() -> Json<Value> {
    Json(json!({ "success": true }))
}

// ==============================================================================
// NOTICES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_notices(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<NoticeListQuery>,
) -> Result<Json<Value>, AppError> {
    let notices = NoticeService::new(&state).list_notices(query).await?;

    Ok(Json(json!({
        "notices": notices,
        "total": notices.len()
    })))
}

#[axum::debug_handler]
pub async fn get_notice(
    State(state): State<Arc<AppConfig>>,
    Path(notice_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let notice = NoticeService::new(&state).view_notice(parse_id(&notice_id)?).await?;
    Ok(Json(json!(notice)))
}

#[axum::debug_handler]
pub async fn create_notice(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateNoticeRequest>,
) -> Result<Json<Value>, AppError> {
    let notice = NoticeService::new(&state).create_notice(request, auth.token()).await?;
    Ok(Json(json!(notice)))
}

#[axum::debug_handler]
pub async fn update_notice(
    State(state): State<Arc<AppConfig>>,
    Path(notice_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateNoticeRequest>,
) -> Result<Json<Value>, AppError> {
    let notice = NoticeService::new(&state)
        .update_notice(parse_id(&notice_id)?, request, auth.token())
        .await?;
    Ok(Json(json!(notice)))
}

#[axum::debug_handler]
pub async fn delete_notice(
    State(state): State<Arc<AppConfig>>,
    Path(notice_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    NoticeService::new(&state)
        .delete_notice(parse_id(&notice_id)?, auth.token())
        .await?;
    Ok(deleted())
}

// ==============================================================================
// POPUPS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_active_popups(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let popups = PopupService::new(&state).list_active_popups().await?;
    Ok(Json(json!({ "popups": popups })))
}

#[axum::debug_handler]
pub async fn list_popups(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let popups = PopupService::new(&state).list_popups(auth.token()).await?;
    Ok(Json(json!({ "popups": popups })))
}

#[axum::debug_handler]
pub async fn create_popup(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreatePopupRequest>,
) -> Result<Json<Value>, AppError> {
    let popup = PopupService::new(&state).create_popup(request, auth.token()).await?;
    Ok(Json(json!(popup)))
}

#[axum::debug_handler]
pub async fn update_popup(
    State(state): State<Arc<AppConfig>>,
    Path(popup_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdatePopupRequest>,
) -> Result<Json<Value>, AppError> {
    let popup = PopupService::new(&state)
        .update_popup(parse_id(&popup_id)?, request, auth.token())
        .await?;
    Ok(Json(json!(popup)))
}

#[axum::debug_handler]
pub async fn delete_popup(
    State(state): State<Arc<AppConfig>>,
    Path(popup_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    PopupService::new(&state)
        .delete_popup(parse_id(&popup_id)?, auth.token())
        .await?;
    Ok(deleted())
}

// ==============================================================================
// PRICE LIST
// ==============================================================================

#[axum::debug_handler]
pub async fn list_prices(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let categories = PriceService::new(&state).list_grouped().await?;
    Ok(Json(json!({ "categories": categories })))
}

#[axum::debug_handler]
pub async fn create_price_item(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreatePriceItemRequest>,
) -> Result<Json<Value>, AppError> {
    let item = PriceService::new(&state).create_item(request, auth.token()).await?;
    Ok(Json(json!(item)))
}

#[axum::debug_handler]
pub async fn update_price_item(
    State(state): State<Arc<AppConfig>>,
    Path(item_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdatePriceItemRequest>,
) -> Result<Json<Value>, AppError> {
    let item = PriceService::new(&state)
        .update_item(parse_id(&item_id)?, request, auth.token())
        .await?;
    Ok(Json(json!(item)))
}

#[axum::debug_handler]
pub async fn delete_price_item(
    State(state): State<Arc<AppConfig>>,
    Path(item_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    PriceService::new(&state)
        .delete_item(parse_id(&item_id)?, auth.token())
        .await?;
    Ok(deleted())
}
