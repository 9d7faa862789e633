use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use uuid::Uuid;

use crate::{auth::jwt::TokenKind, error::AppError, state::AppState};

/// Which slice of the stores a request may touch. The local backend serves a
/// single global scope; the Postgres backend keys everything by user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserScope {
    Local,
    User(Uuid),
}

impl UserScope {
    /// Stable storage key shared by every backend.
    pub fn key(&self) -> String {
        match self {
            Self::Local => "local".into(),
            Self::User(id) => id.to_string(),
        }
    }
}

/// Extractor resolving the request's scope. With accounts active a Bearer
/// access token is mandatory; without them every request is the local scope.
pub struct Scope(pub UserScope);

#[axum::async_trait]
impl FromRequestParts<AppState> for Scope {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(accounts) = &state.accounts else {
            return Ok(Scope(UserScope::Local));
        };

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header"))?;

        let claims = accounts
            .keys
            .verify(token)
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::unauthorized("Access token required"));
        }

        Ok(Scope(UserScope::User(claims.sub)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_keys_are_stable() {
        assert_eq!(UserScope::Local.key(), "local");
        let id = Uuid::new_v4();
        assert_eq!(UserScope::User(id).key(), id.to_string());
    }
}
