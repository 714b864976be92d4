use crate::error::AppError;
use crate::extractors::AdminUser;
use crate::response::success_one_ok;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.uow().dashboard().stats().await?))
}
