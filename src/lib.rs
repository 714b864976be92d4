//! Crowdfunding REST backend: campaigns, pledges with gateway-charged payments, reviews and categories.

pub mod auth;
pub mod case;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jobs;
pub mod migration;
pub mod models;
pub mod payment;
pub mod repository;
pub mod response;
pub mod routes;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;
pub mod validation;

pub use error::{AppError, ConfigError, PaymentError};
pub use migration::apply_migrations;
pub use routes::{api_routes, common_routes};
pub use settings::Settings;
pub use state::AppState;
pub use store::ensure_database_exists;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full application: common routes, `/api`, and the static frontend as fallback.
/// Unknown non-API paths serve `index.html` so client-side routes resolve.
pub fn build_router(state: AppState) -> Result<Router, ConfigError> {
    let static_dir = state.settings.static_dir.clone();
    let cors_origin = state.settings.cors_origin.clone();
    let frontend = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let mut app = Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state))
        .fallback_service(frontend)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = cors_origin {
        let origin = HeaderValue::from_str(&origin).map_err(|e| ConfigError::Invalid {
            key: "CORS_ORIGIN",
            message: e.to_string(),
        })?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        );
    }
    Ok(app)
}
