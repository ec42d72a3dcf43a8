use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims carried by the session token the social-login provider issues.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    /// Display name from the provider metadata (`full_name`, then `name`, then `nickname`).
    pub fn display_name(&self) -> Option<String> {
        let metadata = self.metadata.as_ref()?;
        ["full_name", "name", "nickname"]
            .iter()
            .filter_map(|key| metadata.get(*key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_with(metadata: Option<serde_json::Value>, role: Option<&str>) -> User {
        User {
            id: "u1".to_string(),
            email: None,
            phone: None,
            role: role.map(str::to_string),
            metadata,
            created_at: None,
        }
    }

    #[test]
    fn display_name_prefers_full_name() {
        let user = user_with(Some(json!({ "name": "Kim", "full_name": "Kim Minji" })), None);
        assert_eq!(user.display_name().as_deref(), Some("Kim Minji"));
    }

    #[test]
    fn display_name_skips_blank_values() {
        let user = user_with(Some(json!({ "full_name": "  ", "nickname": "mj" })), None);
        assert_eq!(user.display_name().as_deref(), Some("mj"));
        assert_eq!(user_with(None, None).display_name(), None);
    }

    #[test]
    fn admin_role_detection() {
        assert!(user_with(None, Some("admin")).is_admin());
        assert!(!user_with(None, Some("user")).is_admin());
        assert!(!user_with(None, None).is_admin());
    }
}
