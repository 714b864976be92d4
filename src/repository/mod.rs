//! One repository per resource, reached through `UnitOfWork`.

mod campaign;
mod category;
mod dashboard;
mod pledge;
mod review;
mod search;
mod user;

pub use campaign::CampaignRepository;
pub use category::CategoryRepository;
pub use dashboard::DashboardRepository;
pub use pledge::{PledgeFilter, PledgeRepository};
pub use review::ReviewRepository;
pub use search::SearchRepository;
pub use user::UserRepository;

use crate::error::AppError;
use crate::payment::PaymentGateway;
use sqlx::PgPool;

/// Aggregates the repositories over one pool and payment gateway.
pub struct UnitOfWork<'a> {
    pool: &'a PgPool,
    gateway: &'a dyn PaymentGateway,
    currency: &'a str,
}

impl<'a> UnitOfWork<'a> {
    pub fn new(pool: &'a PgPool, gateway: &'a dyn PaymentGateway, currency: &'a str) -> Self {
        UnitOfWork {
            pool,
            gateway,
            currency,
        }
    }

    pub fn users(&self) -> UserRepository<'a> {
        UserRepository::new(self.pool)
    }

    pub fn categories(&self) -> CategoryRepository<'a> {
        CategoryRepository::new(self.pool)
    }

    pub fn campaigns(&self) -> CampaignRepository<'a> {
        CampaignRepository::new(self.pool)
    }

    pub fn pledges(&self) -> PledgeRepository<'a> {
        PledgeRepository::new(self.pool, self.gateway, self.currency)
    }

    pub fn reviews(&self) -> ReviewRepository<'a> {
        ReviewRepository::new(self.pool)
    }

    pub fn search(&self) -> SearchRepository<'a> {
        SearchRepository::new(self.pool)
    }

    pub fn dashboard(&self) -> DashboardRepository<'a> {
        DashboardRepository::new(self.pool)
    }
}

/// Map a unique-constraint violation to a 409 with `message`; other errors pass through.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.to_string()),
        _ => AppError::Db(e),
    }
}
