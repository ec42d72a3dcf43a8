use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::admin_middleware;

use crate::handlers;

pub fn notice_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_notices))
        .route("/{notice_id}", get(handlers::get_notice));

    let admin_routes = Router::new()
        .route("/", post(handlers::create_notice))
        .route("/{notice_id}", put(handlers::update_notice).delete(handlers::delete_notice))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}

pub fn popup_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/active", get(handlers::list_active_popups));

    let admin_routes = Router::new()
        .route("/", get(handlers::list_popups).post(handlers::create_popup))
        .route("/{popup_id}", put(handlers::update_popup).delete(handlers::delete_popup))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}

pub fn price_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_prices));

    let admin_routes = Router::new()
        .route("/", post(handlers::create_price_item))
        .route("/{item_id}", put(handlers::update_price_item).delete(handlers::delete_price_item))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
