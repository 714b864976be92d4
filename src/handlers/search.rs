use crate::error::AppError;
use crate::extractors::ListParams;
use crate::models::SearchResults;
use crate::response::success_page;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

const MAX_TERM_LEN: usize = 100;

/// `q` is required. Paging applies to the campaign half of the result.
pub async fn search(State(state): State<AppState>, params: ListParams) -> Result<impl IntoResponse, AppError> {
    let term = params
        .get("q")
        .ok_or_else(|| AppError::BadRequest("query parameter q is required".into()))?;
    if term.chars().count() > MAX_TERM_LEN {
        return Err(AppError::BadRequest(format!(
            "q must be at most {} characters",
            MAX_TERM_LEN
        )));
    }
    let page = params.page()?;
    let uow = state.uow();
    let search = uow.search();
    let campaigns = search.campaigns(term, page).await?;
    let categories = search.categories(term).await?;
    let meta = campaigns.meta();
    Ok(success_page(
        SearchResults {
            campaigns: campaigns.items,
            categories,
        },
        meta,
    ))
}
