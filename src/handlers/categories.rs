use crate::error::AppError;
use crate::extractors::AdminUser;
use crate::models::CategoryRequest;
use crate::response::{success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.uow().categories().list_with_counts().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i32>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.uow().categories().get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    Ok(success_one(state.uow().categories().create(&body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(body): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    Ok(success_one_ok(state.uow().categories().update(id, &body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    state.uow().categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
