use tracing::{debug, warn};

use crate::models::{ReservationError, ReservationStatus};

/// The one transition table every status change goes through, whether it
/// comes from the admin console or a patient cancelling.
pub struct ReservationLifecycle;

impl ReservationLifecycle {
    pub fn allowed_transitions(current: ReservationStatus) -> &'static [ReservationStatus] {
        match current {
            ReservationStatus::Pending => &[
                ReservationStatus::Confirmed,
                ReservationStatus::Completed,
                ReservationStatus::Cancelled,
            ],
            ReservationStatus::Confirmed => &[
                ReservationStatus::Completed,
                ReservationStatus::Cancelled,
            ],
            // Terminal
            ReservationStatus::Completed | ReservationStatus::Cancelled => &[],
        }
    }

    /// Terminal reservations reject every mutation, memo edits included.
    pub fn ensure_mutable(current: ReservationStatus) -> Result<(), ReservationError> {
        if current.is_terminal() {
            warn!("Rejected change to {} reservation", current);
            return Err(ReservationError::TerminalState(current));
        }
        Ok(())
    }

    pub fn validate_transition(
        current: ReservationStatus,
        next: ReservationStatus,
    ) -> Result<(), ReservationError> {
        Self::ensure_mutable(current)?;

        if !Self::allowed_transitions(current).contains(&next) {
            warn!("Invalid status transition attempted: {} -> {}", current, next);
            return Err(ReservationError::InvalidStatusTransition { from: current, to: next });
        }

        debug!("Status transition validated: {} -> {}", current, next);
        Ok(())
    }
}
