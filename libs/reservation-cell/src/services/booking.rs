use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::{department::DepartmentService, doctor::DoctorService};
use notification_cell::{spawn_reservation_notice, ReservationNotice};
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::User;
use shared_utils::validation::{phone_digits, require_field, validate_phone};

use crate::models::{
    parse_date, parse_uuid, validate_guest_password, validate_time_slot, AdminStatusUpdateRequest,
    GuestCancelRequest, GuestLookupRequest, GuestReservationRequest, NonMemberReservation,
    Reservation, ReservationError, ReservationRequest, ReservationSearchQuery, ReservationStatus,
    SlotCheckQuery, SlotCheckResponse,
};
use crate::services::conflict::SlotConflictService;
use crate::services::lifecycle::ReservationLifecycle;
use crate::services::password::hash_password;

const GUEST_LOOKUP_LIMIT: usize = 50;

/// Partial unique index holding one open reservation per doctor, date and slot.
const ACTIVE_SLOT_INDEX: &str = "reservations_active_slot_key";

/// A booking request that passed validation and is ready to insert.
#[derive(Debug)]
struct ReservationDraft {
    patient_name: String,
    phone: String,
    doctor_id: Uuid,
    department_id: Option<Uuid>,
    reservation_date: NaiveDate,
    time_slot: String,
    symptoms: Option<String>,
    user_id: Option<Uuid>,
    password_hash: Option<String>,
}

fn validation(msg: String) -> ReservationError {
    ReservationError::ValidationError(msg)
}

impl ReservationDraft {
    fn from_request(
        request: ReservationRequest,
        name: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, ReservationError> {
        let patient_name = require_field(name.as_deref(), "patient_name").map_err(validation)?;
        let phone = validate_phone(phone.as_deref().unwrap_or_default()).map_err(validation)?;

        let doctor_id = require_field(request.doctor_id.as_deref(), "doctor_id").map_err(validation)?;
        let doctor_id = parse_uuid(&doctor_id, "doctor_id")?;

        let department_id = request.department_id
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_uuid(raw, "department_id"))
            .transpose()?;

        let date = require_field(request.reservation_date.as_deref(), "reservation_date").map_err(validation)?;
        let slot = require_field(request.time_slot.as_deref(), "time_slot").map_err(validation)?;

        Ok(Self {
            patient_name,
            phone,
            doctor_id,
            department_id,
            reservation_date: parse_date(&date)?,
            time_slot: validate_time_slot(&slot)?,
            symptoms: request.symptoms.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            user_id: None,
            password_hash: None,
        })
    }
}

pub struct ReservationBookingService {
    supabase: SupabaseClient,
    doctors: DoctorService,
    departments: DepartmentService,
    config: AppConfig,
}

impl ReservationBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
            departments: DepartmentService::new(config),
            config: config.clone(),
        }
    }

    fn service_token(&self) -> &str {
        self.config.service_token()
    }

    // ==========================================================================
    // SLOT QUERIES
    // ==========================================================================

    pub async fn check_slot(&self, query: SlotCheckQuery) -> Result<SlotCheckResponse, ReservationError> {
        let time_slot = validate_time_slot(&query.time_slot)?;

        SlotConflictService::new(&self.supabase)
            .check_slot(
                query.doctor_id,
                query.reservation_date,
                &time_slot,
                query.exclude_reservation_id,
                self.service_token(),
            )
            .await
    }

    pub async fn taken_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<String>, ReservationError> {
        SlotConflictService::new(&self.supabase)
            .taken_slots(doctor_id, date, self.service_token())
            .await
    }

    // ==========================================================================
    // CREATION
    // ==========================================================================

    /// Identity comes from the session; body name and phone only fill what
    /// the session lacks.
    pub async fn create_member_reservation(
        &self,
        user: &User,
        request: ReservationRequest,
        auth_token: &str,
    ) -> Result<Reservation, ReservationError> {
        let user_id = parse_uuid(&user.id, "session user id")?;

        let name = user.display_name().or_else(|| request.patient_name.clone());
        let phone = user.phone.clone()
            .filter(|p| validate_phone(p).is_ok())
            .or_else(|| request.phone.clone());

        let mut draft = ReservationDraft::from_request(request, name, phone)?;
        draft.user_id = Some(user_id);

        self.book(draft, auth_token).await
    }

    pub async fn create_guest_reservation(
        &self,
        request: GuestReservationRequest,
    ) -> Result<Reservation, ReservationError> {
        let GuestReservationRequest { reservation, password } = request;

        let name = reservation.patient_name.clone();
        let phone = reservation.phone.clone();
        let mut draft = ReservationDraft::from_request(reservation, name, phone)?;

        let password = validate_guest_password(password.as_deref())?;
        let password_hash = hash_password(&password)
            .map_err(|e| ReservationError::DatabaseError(format!("Failed to hash password: {}", e)))?;
        draft.password_hash = Some(password_hash);

        let token = self.service_token().to_string();
        self.book(draft, &token).await
    }

    async fn book(&self, draft: ReservationDraft, insert_token: &str) -> Result<Reservation, ReservationError> {
        let doctor = self.doctors.get_active_doctor(draft.doctor_id, None).await?;

        if let Some(requested) = draft.department_id {
            if !doctor.belongs_to(requested) {
                warn!(
                    "Department mismatch: doctor {} belongs to {}, request named {}",
                    doctor.id, doctor.department_id, requested
                );
                return Err(ReservationError::ValidationError(
                    "Doctor does not belong to the selected department".to_string(),
                ));
            }
        }

        let slot = SlotConflictService::new(&self.supabase)
            .check_slot(doctor.id, draft.reservation_date, &draft.time_slot, None, self.service_token())
            .await?;
        if !slot.available {
            return Err(ReservationError::SlotTaken);
        }

        let now = Utc::now().to_rfc3339();
        let row = json!({
            "patient_name": draft.patient_name,
            "phone": draft.phone,
            "doctor_id": doctor.id,
            "department_id": doctor.department_id,
            "reservation_date": draft.reservation_date,
            "time_slot": draft.time_slot,
            "status": ReservationStatus::Pending,
            "symptoms": draft.symptoms,
            "memo": null,
            "user_id": draft.user_id,
            "password_hash": draft.password_hash,
            "created_at": now,
            "updated_at": now
        });

        // The partial unique index settles races the pre-check cannot see.
        let created: Vec<Reservation> = self.supabase
            .insert("reservations", Some(insert_token), row)
            .await
            .map_err(|e| {
                if e.is_unique_violation_on(ACTIVE_SLOT_INDEX) {
                    warn!(
                        "Slot {} {} for doctor {} taken during insert",
                        draft.reservation_date, draft.time_slot, doctor.id
                    );
                    ReservationError::SlotTaken
                } else if e.is_foreign_key_violation() {
                    // doctor or department removed after the lookup above
                    warn!("Doctor {} vanished before insert: {}", doctor.id, e);
                    ReservationError::DoctorNotFound
                } else {
                    e.into()
                }
            })?;

        let reservation = created.into_iter().next()
            .ok_or_else(|| ReservationError::DatabaseError("Insert returned no row".to_string()))?;

        info!(
            "Reservation {} booked: doctor {} on {} at {} ({})",
            reservation.id,
            reservation.doctor_id,
            reservation.reservation_date,
            reservation.time_slot,
            if reservation.is_member() { "member" } else { "non-member" }
        );

        self.notify_booked(&reservation, &doctor.name).await;

        Ok(reservation)
    }

    /// Never fails the booking.
    async fn notify_booked(&self, reservation: &Reservation, doctor_name: &str) {
        if !self.config.is_notification_configured() {
            debug!("Message provider not configured; no notice for {}", reservation.id);
            return;
        }

        let department = match self.departments.get_department(reservation.department_id, None).await {
            Ok(department) => department.name,
            Err(e) => {
                warn!("Department lookup for notice failed: {}", e);
                String::new()
            }
        };

        let notice = ReservationNotice {
            recipient: phone_digits(&reservation.phone),
            patient_name: reservation.patient_name.clone(),
            date: reservation.reservation_date,
            time: reservation.time_slot.clone(),
            department,
            doctor: doctor_name.to_string(),
        };

        spawn_reservation_notice(&self.config, notice);
    }

    // ==========================================================================
    // READS
    // ==========================================================================

    async fn fetch(&self, reservation_id: Uuid, auth_token: &str) -> Result<Reservation, ReservationError> {
        let path = format!("/rest/v1/reservations?id=eq.{}", reservation_id);
        let result: Vec<Reservation> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result.into_iter().next().ok_or(ReservationError::NotFound)
    }

    /// Owner or admin only.
    pub async fn get_reservation(&self, reservation_id: Uuid, viewer: &User) -> Result<Reservation, ReservationError> {
        let reservation = self.fetch(reservation_id, self.service_token()).await?;

        if !viewer.is_admin() && !reservation.is_owned_by(&viewer.id) {
            warn!("User {} attempted to read reservation {}", viewer.id, reservation_id);
            return Err(ReservationError::Forbidden);
        }

        Ok(reservation)
    }

    pub async fn list_member_reservations(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Reservation>, ReservationError> {
        let user_id = parse_uuid(&user.id, "session user id")?;
        let path = format!("/rest/v1/reservations?user_id=eq.{}&order=created_at.desc", user_id);

        let reservations: Vec<Reservation> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(reservations)
    }

    pub async fn search_reservations(
        &self,
        query: ReservationSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Reservation>, ReservationError> {
        debug!("Searching reservations with query: {:?}", query);

        let mut query_parts = vec!["order=reservation_date.desc,time_slot.desc".to_string()];

        if let Some(doctor_id) = query.doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(department_id) = query.department_id {
            query_parts.push(format!("department_id=eq.{}", department_id));
        }
        if let Some(status) = query.status.as_deref().filter(|s| !s.trim().is_empty()) {
            let status: ReservationStatus = status.parse()?;
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(from) = query.date_from {
            query_parts.push(format!("reservation_date=gte.{}", from));
        }
        if let Some(to) = query.date_to {
            query_parts.push(format!("reservation_date=lte.{}", to));
        }
        if let Some(phone) = query.phone {
            let digits = phone_digits(&phone);
            if !digits.is_empty() {
                query_parts.push(format!("phone_digits=like.*{}*", digits));
            }
        }
        if let Some(name) = query.patient_name.filter(|n| !n.trim().is_empty()) {
            query_parts.push(format!("patient_name=ilike.*{}*", urlencoding::encode(name.trim())));
        }

        let limit = query.limit.unwrap_or(50).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);
        query_parts.push(format!("limit={}", limit));
        query_parts.push(format!("offset={}", offset));

        let path = format!("/rest/v1/reservations?{}", query_parts.join("&"));
        let reservations: Vec<Reservation> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(reservations)
    }

    /// Non-member reservations for a phone whose password verifies.
    pub async fn lookup_guest_reservations(
        &self,
        request: GuestLookupRequest,
    ) -> Result<Vec<Reservation>, ReservationError> {
        let phone = validate_phone(request.phone.as_deref().unwrap_or_default()).map_err(validation)?;
        let password = require_field(request.password.as_deref(), "password").map_err(validation)?;

        let path = format!(
            "/rest/v1/reservations?user_id=is.null&phone_digits=eq.{}&order=reservation_date.desc,time_slot.desc&limit={}",
            phone_digits(&phone), GUEST_LOOKUP_LIMIT
        );
        let rows: Vec<Reservation> = self.supabase
            .request(Method::GET, &path, Some(self.service_token()), None)
            .await?;

        let matches: Vec<Reservation> = rows
            .into_iter()
            .filter_map(|row| NonMemberReservation::try_from(row).ok())
            .filter(|guest| guest.verify(&phone, &password))
            .map(NonMemberReservation::into_inner)
            .collect();

        // Unknown phone and wrong password look the same from outside.
        if matches.is_empty() {
            return Err(ReservationError::NotFound);
        }

        Ok(matches)
    }

    // ==========================================================================
    // STATUS CHANGES
    // ==========================================================================

    async fn apply_change(
        &self,
        current: &Reservation,
        status: Option<ReservationStatus>,
        memo: Option<String>,
        auth_token: &str,
    ) -> Result<Reservation, ReservationError> {
        let mut changes = Map::new();
        if let Some(status) = status {
            changes.insert("status".to_string(), json!(status));
        }
        if let Some(memo) = memo {
            changes.insert("memo".to_string(), json!(memo));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        // Guarded on the status that was validated; no row back means another
        // writer moved it first.
        let filter = format!("id=eq.{}&status=eq.{}", current.id, current.status);
        let updated: Vec<Reservation> = self.supabase
            .update("reservations", &filter, Some(auth_token), Value::Object(changes))
            .await?;

        updated.into_iter().next().ok_or(ReservationError::ConcurrentModification)
    }

    pub async fn admin_update(
        &self,
        reservation_id: Uuid,
        request: AdminStatusUpdateRequest,
        admin: &User,
        auth_token: &str,
    ) -> Result<Reservation, ReservationError> {
        let next = request.status
            .as_deref()
            .map(str::parse::<ReservationStatus>)
            .transpose()?;

        if next.is_none() && request.memo.is_none() {
            return Err(ReservationError::ValidationError("status or memo is required".to_string()));
        }

        let current = self.fetch(reservation_id, auth_token).await?;
        match next {
            Some(next) => ReservationLifecycle::validate_transition(current.status, next)?,
            None => ReservationLifecycle::ensure_mutable(current.status)?,
        }

        let updated = self.apply_change(&current, next, request.memo, auth_token).await?;

        info!(
            "Reservation {} updated by admin {}: {} -> {}",
            reservation_id, admin.id, current.status, updated.status
        );
        Ok(updated)
    }

    /// Ownership is checked before the status so a stranger learns nothing
    /// about the reservation's state.
    pub async fn cancel_as_member(
        &self,
        reservation_id: Uuid,
        user: &User,
    ) -> Result<Reservation, ReservationError> {
        let current = self.fetch(reservation_id, self.service_token()).await?;

        if !current.is_owned_by(&user.id) {
            warn!("User {} attempted to cancel reservation {}", user.id, reservation_id);
            return Err(ReservationError::Forbidden);
        }

        ReservationLifecycle::validate_transition(current.status, ReservationStatus::Cancelled)?;
        let updated = self
            .apply_change(&current, Some(ReservationStatus::Cancelled), None, self.service_token())
            .await?;

        info!("Reservation {} cancelled by member {}", reservation_id, user.id);
        Ok(updated)
    }

    pub async fn cancel_as_guest(&self, request: GuestCancelRequest) -> Result<Reservation, ReservationError> {
        let reservation_id = require_field(request.reservation_id.as_deref(), "reservation_id").map_err(validation)?;
        let reservation_id = parse_uuid(&reservation_id, "reservation_id")?;
        let phone = validate_phone(request.phone.as_deref().unwrap_or_default()).map_err(validation)?;
        let password = require_field(request.password.as_deref(), "password").map_err(validation)?;

        let current = self.fetch(reservation_id, self.service_token()).await?;

        let guest = NonMemberReservation::try_from(current).map_err(|_| ReservationError::Forbidden)?;
        if !guest.verify(&phone, &password) {
            warn!("Guest credentials did not match reservation {}", reservation_id);
            return Err(ReservationError::Forbidden);
        }
        let current = guest.into_inner();

        ReservationLifecycle::validate_transition(current.status, ReservationStatus::Cancelled)?;
        let updated = self
            .apply_change(&current, Some(ReservationStatus::Cancelled), None, self.service_token())
            .await?;

        info!("Reservation {} cancelled by non-member", reservation_id);
        Ok(updated)
    }

    pub async fn delete_reservation(&self, reservation_id: Uuid, auth_token: &str) -> Result<(), ReservationError> {
        let path = format!("/rest/v1/reservations?id=eq.{}", reservation_id);
        let deleted: Vec<Reservation> = self.supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        if deleted.is_empty() {
            return Err(ReservationError::NotFound);
        }

        info!("Reservation {} deleted", reservation_id);
        Ok(())
    }
}
