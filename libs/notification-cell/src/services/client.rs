use std::fmt;

use reqwest::Client;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{NotificationError, ReservationNotice, SendMessageRequest, SendMessageResponse};

/// Client for the templated-message provider (KakaoTalk alimtalk / SMS relay).
pub struct NotificationClient {
    client: Client,
    base_url: String,
    api_key: String,
    sender: String,
    template_code: String,
}

impl fmt::Debug for NotificationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("sender", &self.sender)
            .field("template_code", &self.template_code)
            .finish_non_exhaustive()
    }
}

impl NotificationClient {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_notification_configured() {
            return Err(NotificationError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.notification_api_url.trim_end_matches('/').to_string(),
            api_key: config.notification_api_key.clone(),
            sender: config.notification_sender.clone(),
            template_code: config.notification_template_code.clone(),
        })
    }

    /// One delivery attempt.
    /// POST {base}/messages/send
    pub async fn send(&self, notice: &ReservationNotice) -> Result<SendMessageResponse, NotificationError> {
        let url = format!("{}/messages/send", self.base_url);
        let body = SendMessageRequest::render(notice, &self.template_code, &self.sender);

        debug!("Sending {} message to provider: {}", self.template_code, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Message provider returned {}: {}", status, response_text);
            return Err(NotificationError::Provider {
                status: status.as_u16(),
                message: response_text,
            });
        }

        // Providers differ in what they echo back; an unreadable body is still a success.
        Ok(serde_json::from_str(&response_text).unwrap_or_default())
    }
}
