use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    require_text, ContentError, CreateNoticeRequest, Notice, NoticeListQuery, UpdateNoticeRequest,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

pub struct NoticeService {
    supabase: SupabaseClient,
}

impl NoticeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Pinned notices first, then newest first.
    pub async fn list_notices(&self, query: NoticeListQuery) -> Result<Vec<Notice>, ContentError> {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);

        let path = format!(
            "/rest/v1/notices?order=is_pinned.desc,created_at.desc&limit={}&offset={}",
            limit, offset
        );
        debug!("Listing notices: {}", path);

        let notices: Vec<Notice> = self.supabase
            .request(Method::GET, &path, None, None)
            .await?;

        Ok(notices)
    }

    pub async fn get_notice(&self, notice_id: Uuid) -> Result<Notice, ContentError> {
        let path = format!("/rest/v1/notices?id=eq.{}", notice_id);
        let result: Vec<Notice> = self.supabase
            .request(Method::GET, &path, None, None)
            .await?;

        result.into_iter().next().ok_or(ContentError::NotFound("Notice"))
    }

    /// Public read. Counting the view is best-effort and never fails the read.
    pub async fn view_notice(&self, notice_id: Uuid) -> Result<Notice, ContentError> {
        let mut notice = self.get_notice(notice_id).await?;

        match self.supabase
            .execute(
                Method::POST,
                "/rest/v1/rpc/increment_notice_view_count",
                None,
                Some(json!({ "notice_id": notice_id })),
            )
            .await
        {
            Ok(()) => notice.view_count += 1,
            Err(e) => warn!("Failed to count view for notice {}: {}", notice_id, e),
        }

        Ok(notice)
    }

    pub async fn create_notice(
        &self,
        request: CreateNoticeRequest,
        auth_token: &str,
    ) -> Result<Notice, ContentError> {
        let now = Utc::now().to_rfc3339();
        let row = json!({
            "title": require_text(&request.title, "title")?,
            "content": require_text(&request.content, "content")?,
            "is_pinned": request.is_pinned.unwrap_or(false),
            "view_count": 0,
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Notice> = self.supabase
            .insert("notices", Some(auth_token), row)
            .await?;

        let notice = created.into_iter().next()
            .ok_or_else(|| ContentError::DatabaseError("Failed to create notice".to_string()))?;

        info!("Notice created: {}", notice.id);
        Ok(notice)
    }

    pub async fn update_notice(
        &self,
        notice_id: Uuid,
        request: UpdateNoticeRequest,
        auth_token: &str,
    ) -> Result<Notice, ContentError> {
        let mut changes = serde_json::Map::new();

        if let Some(title) = request.title {
            changes.insert("title".to_string(), json!(require_text(&title, "title")?));
        }
        if let Some(content) = request.content {
            changes.insert("content".to_string(), json!(require_text(&content, "content")?));
        }
        if let Some(is_pinned) = request.is_pinned {
            changes.insert("is_pinned".to_string(), json!(is_pinned));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = format!("id=eq.{}", notice_id);
        let updated: Vec<Notice> = self.supabase
            .update("notices", &filter, Some(auth_token), Value::Object(changes))
            .await?;

        updated.into_iter().next().ok_or(ContentError::NotFound("Notice"))
    }

    pub async fn delete_notice(&self, notice_id: Uuid, auth_token: &str) -> Result<(), ContentError> {
        self.get_notice(notice_id).await?;

        let path = format!("/rest/v1/notices?id=eq.{}", notice_id);
        self.supabase
            .execute(Method::DELETE, &path, Some(auth_token), None)
            .await?;

        info!("Notice deleted: {}", notice_id);
        Ok(())
    }
}
