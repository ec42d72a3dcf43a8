use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::User;
use shared_utils::validation::{phone_digits, require_field, validate_phone};

use crate::models::{
    validate_role, UpdateProfileRequest, UserError, UserProfile, UserSearchQuery, ROLE_USER,
};

pub struct ProfileService {
    supabase: SupabaseClient,
}

impl ProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn parse_user_id(user: &User) -> Result<Uuid, UserError> {
        Uuid::parse_str(&user.id)
            .map_err(|_| UserError::ValidationError("Session subject is not a valid user id".to_string()))
    }

    pub async fn get_profile(&self, user_id: Uuid, auth_token: &str) -> Result<UserProfile, UserError> {
        debug!("Fetching profile: {}", user_id);

        let path = format!("/rest/v1/profiles?id=eq.{}", user_id);
        let result: Vec<UserProfile> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result.into_iter().next().ok_or(UserError::NotFound)
    }

    /// Returns the caller's profile, creating it from the session claims on
    /// first access after social sign-up.
    pub async fn get_or_create_own(&self, user: &User, auth_token: &str) -> Result<UserProfile, UserError> {
        let user_id = Self::parse_user_id(user)?;

        match self.get_profile(user_id, auth_token).await {
            Err(UserError::NotFound) => {}
            other => return other,
        }

        let now = Utc::now().to_rfc3339();
        let provider = user.metadata.as_ref()
            .and_then(|m| m.get("provider"))
            .and_then(|p| p.as_str())
            .map(str::to_string);

        let row = json!({
            "id": user_id,
            "name": user.display_name(),
            "email": user.email,
            "phone": user.phone.as_deref().and_then(|p| validate_phone(p).ok()),
            "role": ROLE_USER,
            "provider": provider,
            "created_at": now,
            "updated_at": now
        });

        match self.supabase.insert::<UserProfile>("profiles", Some(auth_token), row).await {
            Ok(created) => {
                let profile = created.into_iter().next().ok_or(UserError::NotFound)?;
                info!("Profile created for user {}", profile.id);
                Ok(profile)
            }
            // Two first requests raced; the other one created it.
            Err(e) if e.is_unique_violation_on("profiles_pkey") => self.get_profile(user_id, auth_token).await,
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_own(
        &self,
        user: &User,
        request: UpdateProfileRequest,
        auth_token: &str,
    ) -> Result<UserProfile, UserError> {
        let user_id = Self::parse_user_id(user)?;
        let mut changes = serde_json::Map::new();

        if let Some(name) = request.name {
            let name = require_field(Some(&name), "name").map_err(UserError::ValidationError)?;
            changes.insert("name".to_string(), json!(name));
        }
        if let Some(phone) = request.phone {
            let phone = validate_phone(&phone).map_err(UserError::ValidationError)?;
            changes.insert("phone".to_string(), json!(phone));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = format!("id=eq.{}", user_id);
        let updated: Vec<UserProfile> = self.supabase
            .update("profiles", &filter, Some(auth_token), Value::Object(changes))
            .await?;

        updated.into_iter().next().ok_or(UserError::NotFound)
    }

    pub async fn search_users(
        &self,
        query: UserSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<UserProfile>, UserError> {
        debug!("Searching users with query: {:?}", query);

        let mut query_parts = vec!["order=created_at.desc".to_string()];

        if let Some(name) = query.name.filter(|v| !v.trim().is_empty()) {
            query_parts.push(format!("name=ilike.*{}*", urlencoding::encode(name.trim())));
        }
        if let Some(email) = query.email.filter(|v| !v.trim().is_empty()) {
            query_parts.push(format!("email=ilike.*{}*", urlencoding::encode(email.trim())));
        }
        if let Some(phone) = query.phone.filter(|v| !v.trim().is_empty()) {
            query_parts.push(format!("phone_digits=like.*{}*", phone_digits(&phone)));
        }
        if let Some(role) = query.role {
            query_parts.push(format!("role=eq.{}", validate_role(&role)?));
        }

        let limit = query.limit.unwrap_or(50).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);
        query_parts.push(format!("limit={}", limit));
        query_parts.push(format!("offset={}", offset));

        let path = format!("/rest/v1/profiles?{}", query_parts.join("&"));
        let users: Vec<UserProfile> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(users)
    }

    pub async fn update_role(
        &self,
        target_id: Uuid,
        role: &str,
        acting_admin: &User,
        auth_token: &str,
    ) -> Result<UserProfile, UserError> {
        let role = validate_role(role)?;

        if acting_admin.id == target_id.to_string() {
            warn!("Admin {} attempted to change their own role", acting_admin.id);
            return Err(UserError::ValidationError("Admins cannot change their own role".to_string()));
        }

        let filter = format!("id=eq.{}", target_id);
        let updated: Vec<UserProfile> = self.supabase
            .update(
                "profiles",
                &filter,
                Some(auth_token),
                json!({ "role": role, "updated_at": Utc::now().to_rfc3339() }),
            )
            .await?;

        let profile = updated.into_iter().next().ok_or(UserError::NotFound)?;
        info!("User {} role set to {} by {}", profile.id, role, acting_admin.id);
        Ok(profile)
    }

    pub async fn delete_user(
        &self,
        target_id: Uuid,
        acting_admin: &User,
        auth_token: &str,
    ) -> Result<(), UserError> {
        if acting_admin.id == target_id.to_string() {
            return Err(UserError::ValidationError("Admins cannot delete their own account".to_string()));
        }

        let path = format!("/rest/v1/profiles?id=eq.{}", target_id);
        let deleted: Vec<UserProfile> = self.supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        if deleted.is_empty() {
            return Err(UserError::NotFound);
        }

        info!("User {} deleted by {}", target_id, acting_admin.id);
        Ok(())
    }
}
