use super::campaign::{SUMMARY_COLUMNS, SUMMARY_FROM};
use crate::error::AppError;
use crate::models::{CampaignSummary, Category, PageRequest, Paged};
use crate::sql::{bind_all, fetch_count, like_pattern, ListQuery, SortDirection};
use sqlx::PgPool;

pub struct SearchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SearchRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        SearchRepository { pool }
    }

    /// Campaigns matching `term` in title or description, title matches first then by amount raised.
    pub async fn campaigns(&self, term: &str, page: PageRequest) -> Result<Paged<CampaignSummary>, AppError> {
        let mut lq = ListQuery::new(SUMMARY_COLUMNS, SUMMARY_FROM);
        lq.filter_contains_any(&["c.title", "c.description"], term)
            .order_by_match_first("c.title", term)
            .order_by("c.amount_raised", SortDirection::Desc)
            .order_by("c.id", SortDirection::Asc);

        let total = fetch_count(self.pool, &lq.build_count()).await?;
        let q = lq.build_page(page.limit(), page.offset());
        tracing::debug!(sql = %q.sql, params = ?q.params, "search");
        let items = bind_all(sqlx::query_as::<_, CampaignSummary>(&q.sql), &q.params)
            .fetch_all(self.pool)
            .await?;
        Ok(Paged { items, total, page })
    }

    /// Categories whose name contains `term`; not paginated.
    pub async fn categories(&self, term: &str) -> Result<Vec<Category>, AppError> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE name ILIKE $1 ORDER BY name",
        )
        .bind(like_pattern(term))
        .fetch_all(self.pool)
        .await?)
    }
}
