use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{ReservationError, ReservationStatus, SlotCheckResponse};

/// PostgREST filter for the statuses that hold a slot, e.g.
/// `status=in.(pending,confirmed)`.
fn slot_holding_filter() -> String {
    let held: Vec<&str> = ReservationStatus::ALL
        .iter()
        .filter(|status| status.holds_slot())
        .map(ReservationStatus::as_str)
        .collect();

    format!("status=in.({})", held.join(","))
}

#[derive(Debug, Deserialize)]
struct SlotRow {
    id: Uuid,
    time_slot: String,
}

/// Read side of the one-active-reservation-per-slot rule. The partial unique
/// index on `reservations` is what actually enforces it; these queries give
/// callers an early answer.
pub struct SlotConflictService<'a> {
    supabase: &'a SupabaseClient,
}

impl<'a> SlotConflictService<'a> {
    pub fn new(supabase: &'a SupabaseClient) -> Self {
        Self { supabase }
    }

    pub async fn check_slot(
        &self,
        doctor_id: Uuid,
        reservation_date: NaiveDate,
        time_slot: &str,
        exclude_reservation_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<SlotCheckResponse, ReservationError> {
        debug!("Checking slot {} {} for doctor {}", reservation_date, time_slot, doctor_id);

        let mut path = format!(
            "/rest/v1/reservations?select=id,time_slot&doctor_id=eq.{}&reservation_date=eq.{}&time_slot=eq.{}&{}",
            doctor_id, reservation_date, time_slot, slot_holding_filter()
        );
        if let Some(exclude) = exclude_reservation_id {
            path.push_str(&format!("&id=neq.{}", exclude));
        }

        let rows: Vec<SlotRow> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let conflicting_reservation_id = rows.first().map(|row| row.id);
        if let Some(existing) = conflicting_reservation_id {
            warn!(
                "Slot {} {} for doctor {} already held by reservation {}",
                reservation_date, time_slot, doctor_id, existing
            );
        }

        Ok(SlotCheckResponse {
            available: conflicting_reservation_id.is_none(),
            conflicting_reservation_id,
        })
    }

    /// Slot tokens already held for a doctor on a day, sorted.
    pub async fn taken_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<String>, ReservationError> {
        let path = format!(
            "/rest/v1/reservations?select=id,time_slot&doctor_id=eq.{}&reservation_date=eq.{}&{}&order=time_slot.asc",
            doctor_id, date, slot_holding_filter()
        );

        let rows: Vec<SlotRow> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let mut slots: Vec<String> = rows.into_iter().map(|row| row.time_slot).collect();
        slots.sort();
        slots.dedup();

        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_reservations_hold_a_slot() {
        assert_eq!(slot_holding_filter(), "status=in.(pending,confirmed)");
    }
}
