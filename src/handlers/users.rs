//! Profile and user administration.

use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::error::AppError;
use crate::extractors::{AdminUser, AuthUser, ListParams};
use crate::models::{CampaignFilter, Role, UpdateProfileRequest, UpdateRoleRequest};
use crate::repository::PledgeFilter;
use crate::response::{success_one_ok, success_page};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.uow().users().get(user.id).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let uow = state.uow();
    let users = uow.users();
    let new_hash = match (body.password, body.current_password) {
        (Some(password), Some(current)) => {
            let record = users
                .find_record(user.id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("user {}", user.id)))?;
            if !verify_password_blocking(current, record.password_hash).await? {
                return Err(AppError::Unauthorized("current password is incorrect".into()));
            }
            Some(hash_password_blocking(password).await?)
        }
        _ => None,
    };
    let updated = users
        .update_profile(user.id, body.display_name.as_deref(), new_hash.as_deref())
        .await?;
    Ok(success_one_ok(updated))
}

pub async fn my_campaigns(
    State(state): State<AppState>,
    user: AuthUser,
    params: ListParams,
) -> Result<impl IntoResponse, AppError> {
    let filter = CampaignFilter {
        owner_id: Some(user.id),
        ..CampaignFilter::default()
    };
    let page = state.uow().campaigns().list(&filter, params.page()?).await?;
    let meta = page.meta();
    Ok(success_page(page.items, meta))
}

pub async fn my_pledges(
    State(state): State<AppState>,
    user: AuthUser,
    params: ListParams,
) -> Result<impl IntoResponse, AppError> {
    let filter = PledgeFilter {
        backer_id: Some(user.id),
        ..PledgeFilter::default()
    };
    let page = state.uow().pledges().list(&filter, params.page()?).await?;
    let meta = page.meta();
    Ok(success_page(page.items, meta))
}

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    params: ListParams,
) -> Result<impl IntoResponse, AppError> {
    let page = state.uow().users().list(params.get("search"), params.page()?).await?;
    let meta = page.meta();
    Ok(success_page(page.items, meta))
}

/// Admins may read anyone; other users only themselves.
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !user.is_admin() && user.id != id {
        return Err(AppError::Forbidden("not allowed to view this user".into()));
    }
    Ok(success_one_ok(state.uow().users().get(id).await?))
}

pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if admin.id == id && body.role != Role::Admin {
        return Err(AppError::BadRequest("you cannot remove your own admin role".into()));
    }
    let user = state.uow().users().set_role(id, body.role).await?;
    tracing::info!(user = %id, role = body.role.as_str(), by = %admin.id, "role changed");
    Ok(success_one_ok(user))
}

pub async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if admin.id == id {
        return Err(AppError::BadRequest("you cannot delete your own account".into()));
    }
    state.uow().users().delete(id).await?;
    tracing::info!(user = %id, by = %admin.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
