//! Authenticated caller from the `Authorization: Bearer <token>` header.

use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner of the resource or an admin.
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.id == owner_id || self.is_admin()
    }

    pub fn ensure_can_manage(&self, owner_id: Uuid, what: &str) -> Result<(), AppError> {
        if self.can_manage(owner_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("not allowed to modify this {}", what)))
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("malformed authorization header".into()))?
        .trim();
    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("malformed authorization header".into()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::Unauthorized("expected a bearer token".into()));
    }
    Ok(token.trim())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.tokens.verify(bearer_token(parts)?)?;
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Authenticated caller with the admin role; others get 403.
#[derive(Clone, Debug)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("admin role required".into()));
        }
        Ok(AdminUser(user))
    }
}
