use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::{NotificationError, ReservationNotice};
use crate::services::client::NotificationClient;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor)).min(MAX_BACKOFF)
}

/// Sends the notice, retrying retryable failures up to `max_retries` extra
/// times. Returns the number of attempts it took.
#[instrument(skip(client, notice), fields(recipient = %notice.recipient))]
pub async fn dispatch_with_retry(
    client: &NotificationClient,
    notice: &ReservationNotice,
    max_retries: u32,
    base_delay_ms: u64,
) -> Result<u32, NotificationError> {
    let mut attempt = 0u32;

    loop {
        match client.send(notice).await {
            Ok(response) => {
                info!(
                    "Reservation notice delivered after {} attempt(s) (message id: {:?})",
                    attempt + 1,
                    response.message_id
                );
                return Ok(attempt + 1);
            }
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = backoff_delay(base_delay_ms, attempt);
                warn!(
                    "Notice attempt {}/{} failed: {}; retrying in {:?}",
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                return Err(NotificationError::RetriesExhausted {
                    attempts: attempt + 1,
                    last_error: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fire-and-forget delivery after a booking. Failures are logged and never
/// reach the caller. Returns `None` when no provider is configured.
pub fn spawn_reservation_notice(config: &AppConfig, notice: ReservationNotice) -> Option<JoinHandle<()>> {
    let client = match NotificationClient::new(config) {
        Ok(client) => client,
        Err(NotificationError::NotConfigured) => {
            debug!("Message provider not configured; skipping reservation notice");
            return None;
        }
        Err(e) => {
            error!("Could not build notification client: {}", e);
            return None;
        }
    };

    let max_retries = config.notification_max_retries;
    let base_delay_ms = config.notification_retry_base_ms;

    Some(tokio::spawn(async move {
        if let Err(e) = dispatch_with_retry(&client, &notice, max_retries, base_delay_ms).await {
            error!("Reservation notice for {} not delivered: {}", notice.recipient, e);
        }
    }))
}
