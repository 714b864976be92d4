//! REST route table, nested under `/api` by the app router.

use crate::error::AppError;
use crate::handlers::{admin, auth, campaigns, categories, pledges, reviews, search, users};
use crate::state::AppState;
use axum::{
    http::Uri,
    routing::{get, post, put},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/me/campaigns", get(users::my_campaigns))
        .route("/users/me/pledges", get(users::my_pledges))
        .route("/users/:id", get(users::get).delete(users::delete))
        .route("/users/:id/role", put(users::update_role))
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/:id",
            get(categories::get).put(categories::update).delete(categories::delete),
        )
        .route("/campaigns", get(campaigns::list).post(campaigns::create))
        .route(
            "/campaigns/:id",
            get(campaigns::get).put(campaigns::update).delete(campaigns::delete),
        )
        .route("/campaigns/:id/pledges", get(campaigns::pledges))
        .route(
            "/campaigns/:id/reviews",
            get(campaigns::reviews).post(campaigns::create_review),
        )
        .route("/pledges", get(pledges::list).post(pledges::create))
        .route("/pledges/:id", get(pledges::get))
        .route(
            "/reviews/:id",
            get(reviews::get).put(reviews::update).delete(reviews::delete),
        )
        .route("/search", get(search::search))
        .route("/admin/stats", get(admin::stats))
        .fallback(not_found)
        .with_state(state)
}

/// Unmatched `/api` paths get a JSON 404 instead of the frontend fallback.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
