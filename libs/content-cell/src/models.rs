use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use shared_database::DbError;
use shared_models::error::AppError;

// ==============================================================================
// NOTICES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notice {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoticeRequest {
    pub title: String,
    pub content: String,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoticeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoticeListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ==============================================================================
// POPUPS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Popup {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Popup {
    /// Active and inside its display window. Missing bounds are open-ended.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.map_or(true, |start| start <= now)
            && self.ends_at.map_or(true, |end| now <= end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePopupRequest {
    pub title: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub is_active: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePopupRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub is_active: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub sort_order: Option<i32>,
}

pub(crate) fn validate_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), ContentError> {
    match (starts_at, ends_at) {
        (Some(start), Some(end)) if start > end => Err(ContentError::ValidationError(
            "starts_at must not be after ends_at".to_string(),
        )),
        _ => Ok(()),
    }
}

// ==============================================================================
// PRICE LIST
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceItem {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    /// Korean won.
    pub price: i64,
    pub description: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePriceItemRequest {
    pub category: String,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePriceItemRequest {
    pub category: Option<String>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceCategory {
    pub category: String,
    pub items: Vec<PriceItem>,
}

/// Groups rows that arrive ordered by category into one entry per category,
/// keeping the incoming order of both categories and items.
pub fn group_by_category(items: Vec<PriceItem>) -> Vec<PriceCategory> {
    let mut groups: Vec<PriceCategory> = Vec::new();

    for item in items {
        match groups.iter_mut().find(|g| g.category == item.category) {
            Some(group) => group.items.push(item),
            None => groups.push(PriceCategory {
                category: item.category.clone(),
                items: vec![item],
            }),
        }
    }

    groups
}

pub(crate) fn validate_price(price: i64) -> Result<(), ContentError> {
    if price < 0 {
        return Err(ContentError::ValidationError("price must not be negative".to_string()));
    }
    Ok(())
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for ContentError {
    fn from(err: DbError) -> Self {
        ContentError::DatabaseError(err.to_string())
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            ContentError::ValidationError(msg) => AppError::ValidationError(msg),
            ContentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<String, ContentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ContentError::ValidationError(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
