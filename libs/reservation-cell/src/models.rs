use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use shared_database::DbError;
use shared_models::error::AppError;
use shared_utils::validation::phone_digits;

use crate::services::password;

// ==============================================================================
// STATUS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::Completed,
        ReservationStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses that hold the time slot.
    pub fn holds_slot(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Completed | ReservationStatus::Cancelled)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "completed" => Ok(ReservationStatus::Completed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(ReservationError::ValidationError(format!("Unknown status: {}", other))),
        }
    }
}

// ==============================================================================
// RESERVATIONS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub patient_name: String,
    pub phone: String,
    pub doctor_id: Uuid,
    pub department_id: Uuid,
    pub reservation_date: NaiveDate,
    /// Zero-padded 24h "HH:MM".
    pub time_slot: String,
    pub status: ReservationStatus,
    pub symptoms: Option<String>,
    pub memo: Option<String>,
    pub user_id: Option<Uuid>,
    /// Argon2 PHC string for non-member bookings. Never serialized outward.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_member(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.map(|id| id.to_string() == user_id).unwrap_or(false)
    }
}

/// A reservation made without an account. Ownership is proven by the
/// phone number plus the password chosen at booking time.
#[derive(Debug, Clone)]
pub struct NonMemberReservation {
    reservation: Reservation,
    password_hash: String,
}

impl NonMemberReservation {
    pub fn into_inner(self) -> Reservation {
        self.reservation
    }

    /// Both the phone and the password must match. Phones compare by digits,
    /// so "010-1234-5678" and "01012345678" are the same number.
    pub fn verify(&self, phone: &str, password: &str) -> bool {
        phone_digits(&self.reservation.phone) == phone_digits(phone)
            && password::verify_password(password, &self.password_hash)
    }
}

impl TryFrom<Reservation> for NonMemberReservation {
    type Error = Reservation;

    fn try_from(reservation: Reservation) -> Result<Self, Self::Error> {
        if reservation.user_id.is_some() {
            return Err(reservation);
        }
        match reservation.password_hash.clone() {
            Some(password_hash) => Ok(Self { reservation, password_hash }),
            None => Err(reservation),
        }
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

/// Booking form. Fields are optional on the wire so a missing value is
/// reported as a validation error instead of a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub doctor_id: Option<String>,
    pub department_id: Option<String>,
    pub reservation_date: Option<String>,
    pub time_slot: Option<String>,
    pub symptoms: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestReservationRequest {
    #[serde(flatten)]
    pub reservation: ReservationRequest,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminStatusUpdateRequest {
    pub status: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestCancelRequest {
    pub reservation_id: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestLookupRequest {
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotCheckQuery {
    pub doctor_id: Uuid,
    pub reservation_date: NaiveDate,
    pub time_slot: String,
    pub exclude_reservation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotCheckResponse {
    pub available: bool,
    pub conflicting_reservation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TakenSlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationSearchQuery {
    pub doctor_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub phone: Option<String>,
    pub patient_name: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

// ==============================================================================
// VALIDATION
// ==============================================================================

pub const MIN_GUEST_PASSWORD_LEN: usize = 4;

/// Same check as the `time_slot` column constraint.
static TIME_SLOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("time slot pattern compiles"));

/// Accepts only a zero-padded 24h "HH:MM" token.
pub fn validate_time_slot(raw: &str) -> Result<String, ReservationError> {
    if !TIME_SLOT_PATTERN.is_match(raw) {
        return Err(ReservationError::ValidationError(format!("Invalid time slot: {}", raw)));
    }

    Ok(raw.to_string())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ReservationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ReservationError::ValidationError(format!("Invalid reservation date: {}", raw)))
}

pub fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, ReservationError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ReservationError::ValidationError(format!("Invalid {}", field)))
}

pub fn validate_guest_password(password: Option<&str>) -> Result<String, ReservationError> {
    match password {
        Some(p) if p.chars().count() >= MIN_GUEST_PASSWORD_LEN => Ok(p.to_string()),
        _ => Err(ReservationError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_GUEST_PASSWORD_LEN
        ))),
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Reservation not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Time slot already reserved")]
    SlotTaken,

    #[error("Cannot change reservation from {from} to {to}")]
    InvalidStatusTransition { from: ReservationStatus, to: ReservationStatus },

    #[error("Reservation is already {0} and can no longer be changed")]
    TerminalState(ReservationStatus),

    #[error("Reservation was modified concurrently")]
    ConcurrentModification,

    #[error("Not allowed to access this reservation")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for ReservationError {
    fn from(err: DbError) -> Self {
        ReservationError::DatabaseError(err.to_string())
    }
}

impl From<DoctorError> for ReservationError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => ReservationError::DoctorNotFound,
            DoctorError::DepartmentNotFound => {
                ReservationError::ValidationError("Department not found".to_string())
            }
            DoctorError::ValidationError(msg) => ReservationError::ValidationError(msg),
            other => ReservationError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::NotFound => AppError::NotFound(err.to_string()),
            ReservationError::DoctorNotFound => AppError::NotFound(err.to_string()),
            ReservationError::SlotTaken => AppError::Conflict(err.to_string()),
            ReservationError::ConcurrentModification => AppError::Conflict(err.to_string()),
            ReservationError::InvalidStatusTransition { .. } => AppError::BadRequest(err.to_string()),
            ReservationError::TerminalState(_) => AppError::BadRequest(err.to_string()),
            ReservationError::Forbidden => AppError::Forbidden(err.to_string()),
            ReservationError::ValidationError(msg) => AppError::ValidationError(msg),
            ReservationError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_slot_format() {
        assert_eq!(validate_time_slot("09:30").unwrap(), "09:30");
        assert!(validate_time_slot("23:59").is_ok());
        assert!(validate_time_slot("00:00").is_ok());

        for bad in ["9:30", "09:3", "24:00", "12:60", "09-30", "0930", "09:30 ", "ab:cd", ""] {
            assert!(validate_time_slot(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in ReservationStatus::ALL {
            assert_eq!(status.as_str().parse::<ReservationStatus>().unwrap(), status);
        }
        assert!("no_show".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn guest_password_length() {
        assert!(validate_guest_password(Some("1234")).is_ok());
        assert!(validate_guest_password(Some("123")).is_err());
        assert!(validate_guest_password(None).is_err());
    }

    fn guest_reservation(phone: &str, password_hash: Option<String>) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            patient_name: "Hong Gildong".to_string(),
            phone: phone.to_string(),
            doctor_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            reservation_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            time_slot: "09:30".to_string(),
            status: ReservationStatus::Pending,
            symptoms: None,
            memo: None,
            user_id: None,
            password_hash,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn guest_verification_compares_phone_digits() {
        let hash = password::hash_password("4821").unwrap();
        let guest = NonMemberReservation::try_from(guest_reservation("010-1234-5678", Some(hash))).unwrap();

        assert!(guest.verify("010-1234-5678", "4821"));
        assert!(guest.verify("01012345678", "4821"));
        assert!(!guest.verify("010-1234-5679", "4821"));
        assert!(!guest.verify("010-1234-5678", "1284"));
    }

    #[test]
    fn only_password_protected_guest_rows_convert() {
        assert!(NonMemberReservation::try_from(guest_reservation("010-1234-5678", None)).is_err());

        let mut member = guest_reservation("010-1234-5678", Some("$argon2id$x".to_string()));
        member.user_id = Some(Uuid::new_v4());
        assert!(NonMemberReservation::try_from(member).is_err());
    }

    #[test]
    fn password_hash_never_serialized() {
        let reservation = Reservation {
            id: Uuid::new_v4(),
            patient_name: "Hong Gildong".to_string(),
            phone: "01012345678".to_string(),
            doctor_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            reservation_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            time_slot: "09:30".to_string(),
            status: ReservationStatus::Pending,
            symptoms: None,
            memo: None,
            user_id: None,
            password_hash: Some("$argon2id$secret".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&reservation).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn error_status_mapping() {
        assert!(matches!(AppError::from(ReservationError::SlotTaken), AppError::Conflict(_)));
        assert!(matches!(AppError::from(ReservationError::Forbidden), AppError::Forbidden(_)));
        assert!(matches!(
            AppError::from(ReservationError::TerminalState(ReservationStatus::Cancelled)),
            AppError::BadRequest(_)
        ));
        assert!(matches!(AppError::from(ReservationError::DoctorNotFound), AppError::NotFound(_)));
    }
}
