use crate::error::AppError;
use crate::models::{CategoryStat, DashboardStats, TopCampaign, Totals};
use sqlx::PgPool;

const TOP_CAMPAIGNS: i64 = 5;

pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        DashboardRepository { pool }
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        let totals = sqlx::query_as::<_, Totals>(
            "SELECT \
               (SELECT COUNT(*) FROM users) AS total_users, \
               (SELECT COUNT(*) FROM campaigns) AS total_campaigns, \
               (SELECT COUNT(*) FROM campaigns WHERE status = 'active') AS active_campaigns, \
               (SELECT COUNT(*) FROM campaigns WHERE amount_raised >= goal_amount) AS funded_campaigns, \
               (SELECT COUNT(*) FROM pledges) AS total_pledges, \
               (SELECT COALESCE(SUM(amount), 0) FROM pledges) AS total_raised, \
               (SELECT COALESCE(ROUND(AVG(amount), 2), 0) FROM pledges) AS average_pledge",
        )
        .fetch_one(self.pool)
        .await?;

        let by_category = sqlx::query_as::<_, CategoryStat>(
            "SELECT cat.id AS category_id, cat.name AS category_name, COUNT(c.id) AS campaign_count, \
             COALESCE(SUM(c.amount_raised), 0) AS amount_raised \
             FROM categories cat LEFT JOIN campaigns c ON c.category_id = cat.id \
             GROUP BY cat.id, cat.name ORDER BY amount_raised DESC, cat.name",
        )
        .fetch_all(self.pool)
        .await?;

        let top_campaigns = sqlx::query_as::<_, TopCampaign>(
            "SELECT c.id, c.title, c.goal_amount, c.amount_raised, \
             (SELECT COUNT(*) FROM pledges p WHERE p.campaign_id = c.id) AS pledge_count \
             FROM campaigns c ORDER BY c.amount_raised DESC, c.created_at DESC LIMIT $1",
        )
        .bind(TOP_CAMPAIGNS)
        .fetch_all(self.pool)
        .await?;

        Ok(DashboardStats {
            totals,
            by_category,
            top_campaigns,
        })
    }
}
