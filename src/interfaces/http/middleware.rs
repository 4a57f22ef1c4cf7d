//! Authentication middleware for Axum
//!
//! Verifies the `Authorization: Bearer <jwt>` header and stores the caller
//! as an [`Actor`] in the request extensions. Handlers behind this layer
//! extract it with `Extension<Actor>`.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::errors::ErrorKind;

use super::common::ApiResponse;
use crate::domain::Actor;
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig};

/// Authentication error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

/// State for the authentication layer
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller from an `Authorization` header value.
pub fn authenticate(auth_header: Option<&str>, config: &JwtConfig) -> Result<Actor, AuthError> {
    let auth_header = auth_header.ok_or(AuthError::MissingToken)?;
    let token = extract_token(auth_header).ok_or(AuthError::InvalidToken)?;

    let claims = verify_token(token, config).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })?;
    claims.actor().map_err(|_| AuthError::InvalidToken)
}

/// JWT authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match authenticate(auth_header, &auth_state.jwt_config) {
        Ok(actor) => {
            tracing::debug!(actor_id = actor.id, role = %actor.role, "Authenticated");
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Err(e) => auth_error_response(e),
    }
}

fn auth_error_response(error: AuthError) -> Response {
    let message = match error {
        AuthError::MissingToken => "Missing authentication token",
        AuthError::InvalidToken => "Invalid authentication token",
        AuthError::ExpiredToken => "Token has expired",
    };

    let body = Json(ApiResponse::<()>::error(message));
    (StatusCode::UNAUTHORIZED, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRole};
    use crate::infrastructure::crypto::jwt::create_token;

    fn token(config: &JwtConfig) -> String {
        let user = User {
            id: 3,
            name: "Carol".into(),
            email: "carol@example.com".into(),
            password_hash: String::new(),
            phone: "555".into(),
            role: UserRole::Customer,
        };
        create_token(&user, config).unwrap()
    }

    #[test]
    fn bearer_token_resolves_actor() {
        let config = JwtConfig::new("secret", 1);
        let header = format!("Bearer {}", token(&config));
        assert_eq!(
            authenticate(Some(&header), &config).unwrap(),
            Actor::customer(3)
        );
    }

    #[test]
    fn header_problems() {
        let config = JwtConfig::new("secret", 1);
        assert_eq!(authenticate(None, &config), Err(AuthError::MissingToken));
        assert_eq!(
            authenticate(Some("Basic abc"), &config),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            authenticate(Some("Bearer not.a.jwt"), &config),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_reported_as_such() {
        let config = JwtConfig::new("secret", -2);
        let header = format!("Bearer {}", token(&config));
        assert_eq!(
            authenticate(Some(&header), &config),
            Err(AuthError::ExpiredToken)
        );
    }
}
