//! Shared application state for all routes.

use crate::auth::TokenService;
use crate::payment::PaymentGateway;
use crate::repository::UnitOfWork;
use crate::settings::Settings;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<Settings>,
    pub tokens: TokenService,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(pool: PgPool, settings: Settings, gateway: Arc<dyn PaymentGateway>) -> Self {
        let tokens = TokenService::new(&settings.jwt_secret, settings.jwt_ttl_minutes);
        AppState {
            pool,
            settings: Arc::new(settings),
            tokens,
            gateway,
        }
    }

    /// Repositories for one request, sharing this state's pool and gateway.
    pub fn uow(&self) -> UnitOfWork<'_> {
        UnitOfWork::new(&self.pool, self.gateway.as_ref(), &self.settings.payment_currency)
    }
}
