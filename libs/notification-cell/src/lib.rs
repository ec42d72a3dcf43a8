pub mod models;
pub mod services;

pub use models::*;
pub use services::client::NotificationClient;
pub use services::dispatch::{backoff_delay, dispatch_with_retry, spawn_reservation_notice};
