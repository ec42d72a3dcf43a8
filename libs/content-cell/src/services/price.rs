use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    group_by_category, require_text, validate_price, ContentError, CreatePriceItemRequest,
    PriceCategory, PriceItem, UpdatePriceItemRequest,
};

pub struct PriceService {
    supabase: SupabaseClient,
}

impl PriceService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_grouped(&self) -> Result<Vec<PriceCategory>, ContentError> {
        let path = "/rest/v1/price_items?order=category.asc,sort_order.asc,name.asc";
        let items: Vec<PriceItem> = self.supabase
            .request(Method::GET, path, None, None)
            .await?;

        Ok(group_by_category(items))
    }

    pub async fn create_item(
        &self,
        request: CreatePriceItemRequest,
        auth_token: &str,
    ) -> Result<PriceItem, ContentError> {
        validate_price(request.price)?;

        let now = Utc::now().to_rfc3339();
        let row = json!({
            "category": require_text(&request.category, "category")?,
            "name": require_text(&request.name, "name")?,
            "price": request.price,
            "description": request.description,
            "sort_order": request.sort_order.unwrap_or(0),
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<PriceItem> = self.supabase
            .insert("price_items", Some(auth_token), row)
            .await?;

        let item = created.into_iter().next()
            .ok_or_else(|| ContentError::DatabaseError("Failed to create price item".to_string()))?;

        info!("Price item created: {} / {}", item.category, item.name);
        Ok(item)
    }

    pub async fn update_item(
        &self,
        item_id: Uuid,
        request: UpdatePriceItemRequest,
        auth_token: &str,
    ) -> Result<PriceItem, ContentError> {
        let mut changes = serde_json::Map::new();

        if let Some(category) = request.category {
            changes.insert("category".to_string(), json!(require_text(&category, "category")?));
        }
        if let Some(name) = request.name {
            changes.insert("name".to_string(), json!(require_text(&name, "name")?));
        }
        if let Some(price) = request.price {
            validate_price(price)?;
            changes.insert("price".to_string(), json!(price));
        }
        if let Some(description) = request.description {
            changes.insert("description".to_string(), json!(description));
        }
        if let Some(sort_order) = request.sort_order {
            changes.insert("sort_order".to_string(), json!(sort_order));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = format!("id=eq.{}", item_id);
        let updated: Vec<PriceItem> = self.supabase
            .update("price_items", &filter, Some(auth_token), Value::Object(changes))
            .await?;

        updated.into_iter().next().ok_or(ContentError::NotFound("Price item"))
    }

    pub async fn delete_item(&self, item_id: Uuid, auth_token: &str) -> Result<(), ContentError> {
        // return=representation tells a missing row apart from a deleted one
        let path = format!("/rest/v1/price_items?id=eq.{}", item_id);
        let deleted: Vec<PriceItem> = self.supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        if deleted.is_empty() {
            return Err(ContentError::NotFound("Price item"));
        }

        info!("Price item deleted: {}", item_id);
        Ok(())
    }
}
