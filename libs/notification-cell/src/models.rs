use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Everything a "reservation received" message needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationNotice {
    pub recipient: String,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub department: String,
    pub doctor: String,
}

impl ReservationNotice {
    /// Template variables, keyed the way the registered template expects them.
    pub fn variables(&self) -> Map<String, Value> {
        let mut vars = Map::new();
        vars.insert("patient_name".to_string(), json!(self.patient_name));
        vars.insert("date".to_string(), json!(self.date.format("%Y-%m-%d").to_string()));
        vars.insert("time".to_string(), json!(self.time));
        vars.insert("department".to_string(), json!(self.department));
        vars.insert("doctor".to_string(), json!(self.doctor));
        vars
    }

    /// Plain-text fallback sent when the template cannot be delivered.
    pub fn fallback_text(&self) -> String {
        format!(
            "[예약 접수] {}님, {} {} {} {} 선생님 진료 예약이 접수되었습니다.",
            self.patient_name,
            self.date.format("%Y-%m-%d"),
            self.time,
            self.department,
            self.doctor,
        )
    }
}

/// Body POSTed to the message provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendMessageRequest {
    pub template_code: String,
    pub to: String,
    pub from: String,
    pub variables: Map<String, Value>,
    pub fallback_text: String,
}

impl SendMessageRequest {
    pub fn render(notice: &ReservationNotice, template_code: &str, sender: &str) -> Self {
        Self {
            template_code: template_code.to_string(),
            to: notice.recipient.clone(),
            from: sender.to_string(),
            variables: notice.variables(),
            fallback_text: notice.fallback_text(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Message provider is not configured")]
    NotConfigured,

    #[error("Provider rejected message ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl NotificationError {
    /// Network failures, throttling and provider outages are worth another try;
    /// a rejected payload is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            NotificationError::Transport(_) => true,
            NotificationError::Provider { status, .. } => *status == 429 || *status >= 500,
            NotificationError::NotConfigured | NotificationError::RetriesExhausted { .. } => false,
        }
    }
}
