use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AdminStatusUpdateRequest, GuestCancelRequest, GuestLookupRequest, GuestReservationRequest,
    ReservationRequest, ReservationSearchQuery, SlotCheckQuery, TakenSlotsQuery,
};
use crate::services::booking::ReservationBookingService;

fn parse_reservation_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid reservation ID format".to_string()))
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_guest_reservation(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<GuestReservationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReservationBookingService::new(&state);
    let reservation = service.create_guest_reservation(request).await?;

    Ok(Json(json!({
        "success": true,
        "reservation": reservation,
        "message": "Reservation received. Use your phone number and password to look it up."
    })))
}

#[axum::debug_handler]
pub async fn lookup_guest_reservations(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<GuestLookupRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReservationBookingService::new(&state);
    let reservations = service.lookup_guest_reservations(request).await?;

    Ok(Json(json!({
        "reservations": reservations,
        "total": reservations.len()
    })))
}

#[axum::debug_handler]
pub async fn cancel_guest_reservation(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<GuestCancelRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReservationBookingService::new(&state);
    let reservation = service.cancel_as_guest(request).await?;

    Ok(Json(json!({
        "success": true,
        "reservation": reservation,
        "message": "Reservation cancelled"
    })))
}

#[axum::debug_handler]
pub async fn check_slot(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SlotCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReservationBookingService::new(&state);
    let result = service.check_slot(query).await?;

    Ok(Json(json!(result)))
}

#[axum::debug_handler]
pub async fn get_taken_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<TakenSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReservationBookingService::new(&state);
    let slots = service.taken_slots(query.doctor_id, query.date).await?;

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": query.date,
        "taken_slots": slots
    })))
}

// ==============================================================================
// MEMBER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_member_reservation(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ReservationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReservationBookingService::new(&state);
    let reservation = service.create_member_reservation(&user, request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "reservation": reservation,
        "message": "Reservation received"
    })))
}

#[axum::debug_handler]
pub async fn list_my_reservations(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = ReservationBookingService::new(&state);
    let reservations = service.list_member_reservations(&user, auth.token()).await?;

    Ok(Json(json!({
        "reservations": reservations,
        "total": reservations.len()
    })))
}

#[axum::debug_handler]
pub async fn get_reservation(
    State(state): State<Arc<AppConfig>>,
    Path(reservation_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let reservation_id = parse_reservation_id(&reservation_id)?;
    let service = ReservationBookingService::new(&state);

    let reservation = service.get_reservation(reservation_id, &user).await?;

    Ok(Json(json!(reservation)))
}

#[axum::debug_handler]
pub async fn cancel_my_reservation(
    State(state): State<Arc<AppConfig>>,
    Path(reservation_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let reservation_id = parse_reservation_id(&reservation_id)?;
    let service = ReservationBookingService::new(&state);

    let reservation = service.cancel_as_member(reservation_id, &user).await?;

    Ok(Json(json!({
        "success": true,
        "reservation": reservation,
        "message": "Reservation cancelled"
    })))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn search_reservations(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ReservationSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReservationBookingService::new(&state);
    let reservations = service.search_reservations(query, auth.token()).await?;

    Ok(Json(json!({
        "reservations": reservations,
        "total": reservations.len()
    })))
}

#[axum::debug_handler]
pub async fn update_reservation_status(
    State(state): State<Arc<AppConfig>>,
    Path(reservation_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<AdminStatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let reservation_id = parse_reservation_id(&reservation_id)?;
    let service = ReservationBookingService::new(&state);

    let reservation = service.admin_update(reservation_id, request, &user, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "reservation": reservation
    })))
}

#[axum::debug_handler]
pub async fn delete_reservation(
    State(state): State<Arc<AppConfig>>,
    Path(reservation_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let reservation_id = parse_reservation_id(&reservation_id)?;
    let service = ReservationBookingService::new(&state);

    service.delete_reservation(reservation_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Reservation deleted"
    })))
}
