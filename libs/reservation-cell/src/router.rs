use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::{admin_middleware, auth_middleware};

use crate::handlers;

pub fn reservation_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/guest", post(handlers::create_guest_reservation))
        .route("/guest/lookup", post(handlers::lookup_guest_reservations))
        .route("/guest/cancel", post(handlers::cancel_guest_reservation))
        .route("/slots/check", get(handlers::check_slot))
        .route("/slots/taken", get(handlers::get_taken_slots));

    let member_routes = Router::new()
        .route("/", post(handlers::create_member_reservation))
        .route("/me", get(handlers::list_my_reservations))
        .route("/{reservation_id}", get(handlers::get_reservation))
        .route("/{reservation_id}/cancel", post(handlers::cancel_my_reservation))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/admin", get(handlers::search_reservations))
        .route("/admin/{reservation_id}/status", patch(handlers::update_reservation_status))
        .route("/admin/{reservation_id}", delete(handlers::delete_reservation))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
        .with_state(state)
}
