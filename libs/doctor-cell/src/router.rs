use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::admin_middleware;

use crate::handlers;

pub fn department_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_departments_public))
        .route("/{department_id}", get(handlers::get_department_public));

    let admin_routes = Router::new()
        .route("/", post(handlers::create_department))
        .route("/admin/all", get(handlers::list_all_departments))
        .route(
            "/{department_id}",
            put(handlers::update_department).delete(handlers::delete_department),
        )
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_doctors_public))
        .route("/{doctor_id}", get(handlers::get_doctor_public));

    let admin_routes = Router::new()
        .route("/", post(handlers::create_doctor))
        .route("/admin/all", get(handlers::list_all_doctors))
        .route(
            "/{doctor_id}",
            put(handlers::update_doctor).delete(handlers::delete_doctor),
        )
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
