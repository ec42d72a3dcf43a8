use anyhow::anyhow;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

/// Postgres SQLSTATEs surfaced by PostgREST on constraint failures.
pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Error)]
pub enum DbError {
    /// Constraint failure. `code` is the SQLSTATE when the body carried one.
    #[error("Constraint violated ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Conflict { code: Option<String>, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] anyhow::Error),
}

impl DbError {
    fn from_response(status: StatusCode, body: &str) -> Self {
        let code = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string));

        if status == StatusCode::CONFLICT || code.as_deref() == Some(UNIQUE_VIOLATION) {
            return DbError::Conflict { code, message: body.to_string() };
        }

        match status.as_u16() {
            401 | 403 => DbError::Unauthorized(body.to_string()),
            404 => DbError::NotFound(body.to_string()),
            _ => DbError::Api { status: status.as_u16(), message: body.to_string() },
        }
    }

    /// True for a unique violation on the named constraint or index.
    pub fn is_unique_violation_on(&self, constraint: &str) -> bool {
        matches!(
            self,
            DbError::Conflict { code: Some(code), message }
                if code == UNIQUE_VIOLATION && message.contains(constraint)
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DbError::Conflict { code: Some(code), .. } if code == FOREIGN_KEY_VIOLATION)
    }
}

pub type DbResult<T> = Result<T, DbError>;

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> DbResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key).map_err(|e| anyhow!("invalid api key header: {}", e))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| anyhow!("invalid authorization header: {}", e))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> DbResult<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> DbResult<T>
    where T: DeserializeOwned {
        let text = self.send(method, path, auth_token, body, extra_headers).await?;

        serde_json::from_str::<T>(&text).map_err(|e| {
            error!("Failed to decode response from {}: {}", path, e);
            DbError::Decode(e.to_string())
        })
    }

    /// Runs a request whose response body is irrelevant (DELETE, fire-and-forget PATCH).
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> DbResult<()> {
        self.send(method, path, auth_token, body, None).await.map(|_| ())
    }

    /// POST returning the inserted rows.
    pub async fn insert<T>(&self, table: &str, auth_token: Option<&str>, row: Value) -> DbResult<Vec<T>>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}", table);
        self.request_with_headers(Method::POST, &path, auth_token, Some(row), Some(Self::return_representation()))
            .await
    }

    /// PATCH on a PostgREST filter returning the updated rows.
    pub async fn update<T>(&self, table: &str, filter: &str, auth_token: Option<&str>, changes: Value) -> DbResult<Vec<T>>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}?{}", table, filter);
        self.request_with_headers(Method::PATCH, &path, auth_token, Some(changes), Some(Self::return_representation()))
            .await
    }

    pub fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> DbResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = DbError::from_response(status, &text);
            match err {
                DbError::Conflict { .. } => warn!("Constraint violation ({}): {}", status, text),
                _ => error!("API error ({}): {}", status, text),
            }
            return Err(err);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"reservations_active_slot_key\""}"#;
        let err = DbError::from_response(StatusCode::CONFLICT, body);
        assert!(matches!(&err, DbError::Conflict { code: Some(code), .. } if code == UNIQUE_VIOLATION));
        assert!(err.is_unique_violation_on("reservations_active_slot_key"));
        assert!(!err.is_unique_violation_on("profiles_pkey"));
        assert!(!err.is_foreign_key_violation());
        // some proxies rewrite the status but keep the SQLSTATE
        assert!(matches!(DbError::from_response(StatusCode::BAD_REQUEST, body), DbError::Conflict { .. }));
    }

    #[test]
    fn foreign_key_violation_keeps_its_code() {
        let body = r#"{"code":"23503","message":"insert or update on table \"reservations\" violates foreign key constraint \"reservations_doctor_id_fkey\""}"#;
        let err = DbError::from_response(StatusCode::CONFLICT, body);
        assert!(err.is_foreign_key_violation());
        assert!(!err.is_unique_violation_on("reservations_active_slot_key"));

        let bare = DbError::from_response(StatusCode::CONFLICT, "not json");
        assert!(matches!(bare, DbError::Conflict { code: None, .. }));
    }

    #[test]
    fn other_statuses() {
        assert!(matches!(DbError::from_response(StatusCode::UNAUTHORIZED, "{}"), DbError::Unauthorized(_)));
        assert!(matches!(DbError::from_response(StatusCode::NOT_FOUND, ""), DbError::NotFound(_)));
        assert!(matches!(
            DbError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            DbError::Api { status: 500, .. }
        ));
    }
}
