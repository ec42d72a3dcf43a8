use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    require_text, validate_window, ContentError, CreatePopupRequest, Popup, UpdatePopupRequest,
};

pub struct PopupService {
    supabase: SupabaseClient,
}

impl PopupService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Popups to show right now. The window is applied here so open-ended
    /// bounds need no special filter syntax.
    pub async fn list_active_popups(&self) -> Result<Vec<Popup>, ContentError> {
        let path = "/rest/v1/popups?is_active=eq.true&order=sort_order.asc,created_at.desc";
        let popups: Vec<Popup> = self.supabase
            .request(Method::GET, path, None, None)
            .await?;

        let now = Utc::now();
        let visible: Vec<Popup> = popups.into_iter().filter(|p| p.is_visible_at(now)).collect();
        debug!("{} popups visible", visible.len());

        Ok(visible)
    }

    pub async fn list_popups(&self, auth_token: &str) -> Result<Vec<Popup>, ContentError> {
        let path = "/rest/v1/popups?order=sort_order.asc,created_at.desc";
        let popups: Vec<Popup> = self.supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        Ok(popups)
    }

    async fn get_popup(&self, popup_id: Uuid, auth_token: &str) -> Result<Popup, ContentError> {
        let path = format!("/rest/v1/popups?id=eq.{}", popup_id);
        let result: Vec<Popup> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result.into_iter().next().ok_or(ContentError::NotFound("Popup"))
    }

    pub async fn create_popup(
        &self,
        request: CreatePopupRequest,
        auth_token: &str,
    ) -> Result<Popup, ContentError> {
        validate_window(request.starts_at, request.ends_at)?;

        let now = Utc::now().to_rfc3339();
        let row = json!({
            "title": require_text(&request.title, "title")?,
            "content": request.content,
            "image_url": request.image_url,
            "link_url": request.link_url,
            "is_active": request.is_active.unwrap_or(true),
            "starts_at": request.starts_at,
            "ends_at": request.ends_at,
            "sort_order": request.sort_order.unwrap_or(0),
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Popup> = self.supabase
            .insert("popups", Some(auth_token), row)
            .await?;

        let popup = created.into_iter().next()
            .ok_or_else(|| ContentError::DatabaseError("Failed to create popup".to_string()))?;

        info!("Popup created: {}", popup.id);
        Ok(popup)
    }

    pub async fn update_popup(
        &self,
        popup_id: Uuid,
        request: UpdatePopupRequest,
        auth_token: &str,
    ) -> Result<Popup, ContentError> {
        // A partial update can move one bound past the stored other bound.
        if request.starts_at.is_some() || request.ends_at.is_some() {
            let current = self.get_popup(popup_id, auth_token).await?;
            validate_window(
                request.starts_at.or(current.starts_at),
                request.ends_at.or(current.ends_at),
            )?;
        }

        let mut changes = serde_json::Map::new();

        if let Some(title) = request.title {
            changes.insert("title".to_string(), json!(require_text(&title, "title")?));
        }
        if let Some(content) = request.content {
            changes.insert("content".to_string(), json!(content));
        }
        if let Some(image_url) = request.image_url {
            changes.insert("image_url".to_string(), json!(image_url));
        }
        if let Some(link_url) = request.link_url {
            changes.insert("link_url".to_string(), json!(link_url));
        }
        if let Some(is_active) = request.is_active {
            changes.insert("is_active".to_string(), json!(is_active));
        }
        if let Some(starts_at) = request.starts_at {
            changes.insert("starts_at".to_string(), json!(starts_at));
        }
        if let Some(ends_at) = request.ends_at {
            changes.insert("ends_at".to_string(), json!(ends_at));
        }
        if let Some(sort_order) = request.sort_order {
            changes.insert("sort_order".to_string(), json!(sort_order));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = format!("id=eq.{}", popup_id);
        let updated: Vec<Popup> = self.supabase
            .update("popups", &filter, Some(auth_token), Value::Object(changes))
            .await?;

        updated.into_iter().next().ok_or(ContentError::NotFound("Popup"))
    }

    pub async fn delete_popup(&self, popup_id: Uuid, auth_token: &str) -> Result<(), ContentError> {
        self.get_popup(popup_id, auth_token).await?;

        let path = format!("/rest/v1/popups?id=eq.{}", popup_id);
        self.supabase
            .execute(Method::DELETE, &path, Some(auth_token), None)
            .await?;

        info!("Popup deleted: {}", popup_id);
        Ok(())
    }
}
