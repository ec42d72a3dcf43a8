use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub notification_api_url: String,
    pub notification_api_key: String,
    pub notification_sender: String,
    pub notification_template_code: String,
    pub notification_max_retries: u32,
    pub notification_retry_base_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, guest reservations will use the anon key");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            notification_api_url: env::var("NOTIFICATION_API_URL")
                .unwrap_or_else(|_| {
                    warn!("NOTIFICATION_API_URL not set, booking messages disabled");
                    String::new()
                }),
            notification_api_key: env::var("NOTIFICATION_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("NOTIFICATION_API_KEY not set, booking messages disabled");
                    String::new()
                }),
            notification_sender: env::var("NOTIFICATION_SENDER").unwrap_or_default(),
            notification_template_code: env::var("NOTIFICATION_TEMPLATE_CODE")
                .unwrap_or_else(|_| "RESERVATION_RECEIVED".to_string()),
            notification_max_retries: parse_or("NOTIFICATION_MAX_RETRIES", 3),
            notification_retry_base_ms: parse_or("NOTIFICATION_RETRY_BASE_MS", 500),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_notification_configured(&self) -> bool {
        !self.notification_api_url.is_empty() && !self.notification_api_key.is_empty()
    }

    /// Key used for server-side writes that have no end-user session behind them.
    pub fn service_token(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid number, using default", key);
            default
        }),
        Err(_) => default,
    }
}
