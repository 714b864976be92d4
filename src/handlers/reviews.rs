use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::models::UpdateReviewRequest;
use crate::response::success_one_ok;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.uow().reviews().get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    Ok(success_one_ok(state.uow().reviews().update(&user, id, &body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.uow().reviews().delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
