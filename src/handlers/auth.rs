//! Registration and login.

use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, Role, User};
use crate::response::{success_one, success_one_ok};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let (token, expires_at) = state.tokens.issue(&user)?;
    Ok(AuthResponse {
        token,
        token_type: "Bearer",
        expires_at,
        user,
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let hash = hash_password_blocking(body.password).await?;
    let user = state
        .uow()
        .users()
        .create(&body.email, &body.display_name, &hash, Role::User)
        .await?;
    tracing::info!(user = %user.id, "user registered");
    Ok(success_one(auth_response(&state, user)?))
}

/// Unknown email and wrong password give the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::Unauthorized("invalid email or password".into());
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(invalid());
    }
    let record = state
        .uow()
        .users()
        .find_record_by_email(&body.email)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password_blocking(body.password, record.password_hash.clone()).await? {
        return Err(invalid());
    }
    Ok(success_one_ok(auth_response(&state, User::from(record))?))
}
