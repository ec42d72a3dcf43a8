use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use auth_cell::router::auth_routes;
use content_cell::router::{notice_routes, popup_routes, price_routes};
use doctor_cell::router::{department_routes, doctor_routes};
use reservation_cell::router::reservation_routes;
use shared_config::AppConfig;
use user_cell::router::user_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic reservation API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/departments", department_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/notices", notice_routes(state.clone()))
        .nest("/popups", popup_routes(state.clone()))
        .nest("/prices", price_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/reservations", reservation_routes(state))
}
