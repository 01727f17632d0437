//! Bearer-token authentication context.
//!
//! Tokens are HS256 JWTs issued by an external login service; the `sub` claim
//! carries the username. A request without a token is anonymous. A token
//! that fails validation is rejected.

use crate::api::{ApiError, state::AppState};
use adrive_core::AuthContext;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::{debug, error};

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Attach an [`AuthContext`] to every request.
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let auth = match resolve(&state, req.headers().get(axum::http::header::AUTHORIZATION)) {
        Ok(auth) => auth,
        Err(err) => return err.into_response(),
    };
    req.extensions_mut().insert(auth);
    next.run(req).await
}

fn resolve(state: &AppState, header: Option<&HeaderValue>) -> Result<AuthContext, ApiError> {
    let Some(secret) = state.jwt_secret.as_deref() else {
        return Ok(AuthContext::Anonymous);
    };
    let Some(token) = extract_bearer(header) else {
        return Ok(AuthContext::Anonymous);
    };

    let validation = Validation::new(Algorithm::HS256);
    let key = DecodingKey::from_secret(secret.as_bytes());
    let claims = decode::<Claims>(&token, &key, &validation)
        .map_err(|err| {
            debug!(error = %err, "Rejected bearer token");
            ApiError::unauthorized()
        })?
        .claims;

    state.core.auth_context(Some(&claims.sub)).map_err(|err| {
        error!(error = %err, "Failed to look up session user");
        ApiError::from(err)
    })
}

fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
}

/// The caller's username, or 401.
pub fn require_user(auth: &AuthContext) -> Result<&str, ApiError> {
    auth.username().ok_or_else(ApiError::unauthorized)
}

/// Succeeds only for an authenticated administrator.
pub fn require_admin(state: &AppState, auth: &AuthContext) -> Result<(), ApiError> {
    require_user(auth)?;
    if state.core.is_admin(auth)? {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator access required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        let header = HeaderValue::from_static("Bearer abc.def ");
        assert_eq!(extract_bearer(Some(&header)).as_deref(), Some("abc.def"));
        let header = HeaderValue::from_static("Basic xyz");
        assert_eq!(extract_bearer(Some(&header)), None);
        assert_eq!(extract_bearer(None), None);
    }
}
