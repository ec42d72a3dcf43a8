use std::sync::Arc;
use axum::{middleware, routing::{get, patch}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::{admin_middleware, auth_middleware};

use crate::handlers::*;

pub fn user_routes(config: Arc<AppConfig>) -> Router {
    let member_routes = Router::new()
        .route("/me", get(get_my_profile).patch(update_my_profile))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/", get(search_users))
        .route("/{id}", get(get_user).delete(delete_user))
        .route("/{id}/role", patch(update_user_role))
        .layer(middleware::from_fn_with_state(config.clone(), admin_middleware));

    Router::new()
        .merge(member_routes)
        .merge(admin_routes)
        .with_state(config)
}
