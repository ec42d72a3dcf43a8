use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

/// Validates the bearer token and stores the session [`User`] in request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = user_from_headers(&config, &request)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Same as [`auth_middleware`] but also requires the `admin` role.
pub async fn admin_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = user_from_headers(&config, &request)?;
    require_admin(&user)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        tracing::warn!("User {} attempted an admin-only action", user.id);
        Err(AppError::Forbidden("Admin role required".to_string()))
    }
}

pub fn bearer_token<B>(request: &Request<B>) -> Result<&str, AppError> {
    bearer_from_headers(request.headers())
}

/// Token from an `Authorization: Bearer ...` header.
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

fn user_from_headers<B>(config: &AppConfig, request: &Request<B>) -> Result<User, AppError> {
    let token = bearer_token(request)?;
    validate_token(token, &config.supabase_jwt_secret).map_err(AppError::Auth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestUser;

    #[test]
    fn bearer_token_parsing() {
        let request = Request::builder()
            .header("Authorization", "Bearer abc.def.ghi")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&request).unwrap(), "abc.def.ghi");

        let request = Request::builder().header("Authorization", "Basic xyz").body(()).unwrap();
        assert!(matches!(bearer_token(&request), Err(AppError::Auth(_))));

        let request = Request::builder().body(()).unwrap();
        assert!(matches!(bearer_token(&request), Err(AppError::Auth(_))));
    }

    #[test]
    fn bearer_from_bare_headers() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_from_headers(&headers), Err(AppError::Auth(_))));

        headers.insert("Authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_from_headers(&headers).unwrap(), "abc.def.ghi");

        headers.insert("Authorization", "bearer abc.def.ghi".parse().unwrap());
        assert!(matches!(bearer_from_headers(&headers), Err(AppError::Auth(_))));
    }

    #[test]
    fn require_admin_rejects_members() {
        assert!(require_admin(&TestUser::admin("a@example.com").to_user()).is_ok());
        assert!(matches!(
            require_admin(&TestUser::patient("p@example.com").to_user()),
            Err(AppError::Forbidden(_))
        ));
    }
}
