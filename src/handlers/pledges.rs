use crate::error::AppError;
use crate::extractors::{AdminUser, AuthUser, ListParams};
use crate::models::CreatePledgeRequest;
use crate::repository::PledgeFilter;
use crate::response::{success_one, success_one_ok, success_page};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// 201 with the pledge and its payment; 402 on decline, 502 when the gateway cannot be reached.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreatePledgeRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    Ok(success_one(state.uow().pledges().create(&user, &body).await?))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.uow().pledges().find_visible(&user, id).await?))
}

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    params: ListParams,
) -> Result<impl IntoResponse, AppError> {
    let filter = PledgeFilter {
        campaign_id: params.parse("campaign_id")?,
        backer_id: params.parse("backer_id")?,
    };
    let page = state.uow().pledges().list(&filter, params.page()?).await?;
    let meta = page.meta();
    Ok(success_page(page.items, meta))
}
