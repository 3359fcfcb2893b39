use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use tandem_core::identity::{Principal, Role};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims as issued by the identity collaborator. This service only
/// validates and consumes them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub exp: usize,
}

pub fn principal_from_claims(claims: Claims) -> Principal {
    let roles = claims
        .roles
        .iter()
        .filter_map(|r| Role::parse(r))
        .collect::<Vec<_>>();
    Principal {
        id: claims.sub,
        email: claims.email,
        roles,
    }
}

// ============================================================================
// Authenticated-principal extractor
// ============================================================================

/// Extractor for routes that require an authenticated principal. Public
/// reads simply do not use it.
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // 1. Extract token from Authorization header
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthenticationError("missing Authorization header".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::AuthenticationError("expected a bearer token".to_string())
        })?;

        // 2. Decode and validate JWT
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::AuthenticationError(e.to_string()))?;

        // 3. Hand the principal to the handler
        Ok(AuthUser(principal_from_claims(token_data.claims)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_are_dropped() {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: Some("user@example.com".to_string()),
            roles: vec![
                "PASSENGER".to_string(),
                "SUPERUSER".to_string(),
                "DRIVER".to_string(),
            ],
            exp: 0,
        };
        let principal = principal_from_claims(claims);
        assert_eq!(principal.roles, vec![Role::Passenger, Role::Driver]);
        assert_eq!(principal.id, "user-1");
    }
}
