//! Campaign listing, detail and owner management, plus the nested pledge and review collections.

use crate::error::AppError;
use crate::extractors::{AuthUser, ListParams};
use crate::models::{
    CampaignFilter, CampaignSort, CampaignStatus, CreateCampaignRequest, CreateReviewRequest, UpdateCampaignRequest,
};
use crate::response::{success_one, success_one_ok, success_page};
use crate::sql::SortDirection;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

/// Filters from the query string. Unknown sort keys fall back to the defaults; malformed filter values are 400.
pub fn filter_from_params(params: &ListParams) -> Result<CampaignFilter, AppError> {
    let status = match params.get("status") {
        Some(raw) => Some(
            raw.parse::<CampaignStatus>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        ),
        None => None,
    };
    let filter = CampaignFilter {
        category_id: params.parse("category_id")?,
        status,
        owner_id: params.parse::<Uuid>("owner_id")?,
        search: params.get("search").map(str::to_string),
        min_goal: params.parse::<BigDecimal>("min_goal")?,
        max_goal: params.parse::<BigDecimal>("max_goal")?,
        sort: params.get("sort_by").and_then(CampaignSort::parse).unwrap_or_default(),
        direction: params
            .get("sort_order")
            .and_then(SortDirection::parse)
            .unwrap_or_default(),
    };
    if let (Some(min), Some(max)) = (filter.min_goal.as_ref(), filter.max_goal.as_ref()) {
        if min > max {
            return Err(AppError::BadRequest("minGoal cannot exceed maxGoal".into()));
        }
    }
    Ok(filter)
}

pub async fn list(State(state): State<AppState>, params: ListParams) -> Result<impl IntoResponse, AppError> {
    let filter = filter_from_params(&params)?;
    let page = state.uow().campaigns().list(&filter, params.page()?).await?;
    let meta = page.meta();
    Ok(success_page(page.items, meta))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.uow().campaigns().detail(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate(Utc::now())?;
    Ok(success_one(state.uow().campaigns().create(&user, &body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCampaignRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate(Utc::now())?;
    Ok(success_one_ok(state.uow().campaigns().update(&user, id, &body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.uow().campaigns().delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn pledges(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    params: ListParams,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .uow()
        .pledges()
        .list_for_campaign(&user, id, params.page()?)
        .await?;
    let meta = page.meta();
    Ok(success_page(page.items, meta))
}

pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    params: ListParams,
) -> Result<impl IntoResponse, AppError> {
    let page = state.uow().reviews().list_for_campaign(id, params.page()?).await?;
    let meta = page.meta();
    Ok(success_page(page.items, meta))
}

pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    Ok(success_one(state.uow().reviews().create(&user, id, &body).await?))
}
