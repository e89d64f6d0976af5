use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// The caller behind a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

impl AuthUser {
    /// Owner-only gate: the stored owner must be this user.
    pub fn ensure_owns(&self, owner: Option<i64>, denied: &str) -> Result<(), ApiError> {
        if owner == Some(self.id) {
            return Ok(());
        }
        warn!(
            "User {} denied: owner is {:?} ({})",
            self.id, owner, denied
        );
        Err(ApiError::Forbidden(denied.to_string()))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("User not authenticated".into()))
    }
}

/// Verify the `Authorization: Bearer` JWT and attach the caller as [`AuthUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|e| {
        debug!("Rejected request without bearer token: {}", e);
        ApiError::Unauthorized("Authorization header required".into())
    })?;

    let claims = state.tokens.verify(bearer.token()).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
    });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AuthUser {
        AuthUser {
            id: 7,
            username: "alice".into(),
        }
    }

    #[test]
    fn owner_passes() {
        assert!(alice().ensure_owns(Some(7), "nope").is_ok());
    }

    #[test]
    fn other_owner_or_no_owner_is_forbidden() {
        assert!(matches!(
            alice().ensure_owns(Some(8), "nope"),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            alice().ensure_owns(None, "nope"),
            Err(ApiError::Forbidden(_))
        ));
    }
}
