// Token verification only: tokens are issued by the identity service,
// this layer just validates them and exposes the caller's identity.
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued at
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

fn decode_bearer(request: &Request, secret: &str) -> Option<CurrentUser> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?
    .claims;

    let id = Uuid::parse_str(&claims.sub).ok()?;

    Some(CurrentUser {
        id,
        email: claims.email,
        is_admin: claims.is_admin,
    })
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let current_user = decode_bearer(&request, &state.config.jwt.secret)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

/// Attach the caller identity when a valid token is present, but let
/// anonymous requests through (public report submission).
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(current_user) = decode_bearer(&request, &state.config.jwt.secret) {
        request.extensions_mut().insert(current_user);
    }

    next.run(request).await
}

pub async fn require_admin(
    State(_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let current_user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !current_user.is_admin {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn request_with_bearer(token: &str) -> Request {
        axum::http::Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn valid_token_yields_current_user() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id.to_string(),
            email: "seller@example.com".to_string(),
            is_admin: false,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: chrono::Utc::now().timestamp() as usize,
        };
        let request = request_with_bearer(&token(&claims, "secret"));

        let user = decode_bearer(&request, "secret").unwrap();
        assert_eq!(user.id, user_id);
        assert!(!user.is_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "seller@example.com".to_string(),
            is_admin: true,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: chrono::Utc::now().timestamp() as usize,
        };
        let request = request_with_bearer(&token(&claims, "other-secret"));

        assert!(decode_bearer(&request, "secret").is_none());
    }

    #[test]
    fn missing_header_is_rejected() {
        let request = axum::http::Request::builder().body(Body::empty()).unwrap();
        assert!(decode_bearer(&request, "secret").is_none());
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: "seller@example.com".to_string(),
            is_admin: false,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: chrono::Utc::now().timestamp() as usize,
        };
        let request = request_with_bearer(&token(&claims, "secret"));

        assert!(decode_bearer(&request, "secret").is_none());
    }
}
