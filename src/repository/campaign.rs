use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::models::{
    Campaign, CampaignDetail, CampaignFilter, CampaignStatus, CampaignSummary, CreateCampaignRequest, PageRequest,
    Paged, UpdateCampaignRequest,
};
use crate::sql::{bind_all, fetch_count, CmpOp, ListQuery, SortDirection};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

const CAMPAIGN_COLUMNS: &str = "id, owner_id, category_id, title, description, goal_amount, amount_raised, \
    image_url, status, ends_at, created_at, updated_at";

macro_rules! summary_columns {
    () => {
        "c.id, c.owner_id, c.category_id, c.title, c.description, c.goal_amount, c.amount_raised, \
         c.image_url, c.status, c.ends_at, c.created_at, c.updated_at, \
         u.display_name AS owner_name, cat.name AS category_name, \
         (SELECT COUNT(*) FROM pledges p WHERE p.campaign_id = c.id) AS pledge_count, \
         ROUND(c.amount_raised * 100 / c.goal_amount, 2) AS progress"
    };
}

pub(crate) const SUMMARY_COLUMNS: &str = summary_columns!();
pub(crate) const SUMMARY_FROM: &str =
    "campaigns c JOIN users u ON u.id = c.owner_id JOIN categories cat ON cat.id = c.category_id";

const DETAIL_SQL: &str = concat!(
    "SELECT ",
    summary_columns!(),
    ", (SELECT ROUND(AVG(r.rating)::numeric, 2) FROM reviews r WHERE r.campaign_id = c.id) AS average_rating, \
     (SELECT COUNT(*) FROM reviews r WHERE r.campaign_id = c.id) AS review_count \
     FROM campaigns c JOIN users u ON u.id = c.owner_id JOIN categories cat ON cat.id = c.category_id \
     WHERE c.id = $1"
);

pub struct CampaignRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CampaignRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        CampaignRepository { pool }
    }

    /// Filtered, sorted page of campaign summaries. Ties are broken by id so pages are stable.
    pub async fn list(&self, filter: &CampaignFilter, page: PageRequest) -> Result<Paged<CampaignSummary>, AppError> {
        let mut lq = ListQuery::new(SUMMARY_COLUMNS, SUMMARY_FROM);
        if let Some(category_id) = filter.category_id {
            lq.filter_eq("c.category_id", category_id);
        }
        if let Some(status) = filter.status {
            lq.filter_eq("c.status", status.as_str());
        }
        if let Some(owner_id) = filter.owner_id {
            lq.filter_eq("c.owner_id", owner_id);
        }
        if let Some(term) = filter.search.as_deref() {
            lq.filter_contains_any(&["c.title", "c.description"], term);
        }
        if let Some(min) = filter.min_goal.clone() {
            lq.filter("c.goal_amount", CmpOp::Gte, min);
        }
        if let Some(max) = filter.max_goal.clone() {
            lq.filter("c.goal_amount", CmpOp::Lte, max);
        }
        lq.order_by(filter.sort.column(), filter.direction)
            .order_by("c.id", SortDirection::Asc);

        let total = fetch_count(self.pool, &lq.build_count()).await?;
        let q = lq.build_page(page.limit(), page.offset());
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let items = bind_all(sqlx::query_as::<_, CampaignSummary>(&q.sql), &q.params)
            .fetch_all(self.pool)
            .await?;
        Ok(Paged { items, total, page })
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Campaign>, AppError> {
        let sql = format!("SELECT {} FROM campaigns WHERE id = $1", CAMPAIGN_COLUMNS);
        Ok(sqlx::query_as::<_, Campaign>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Campaign, AppError> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("campaign {}", id)))
    }

    pub async fn detail(&self, id: Uuid) -> Result<CampaignDetail, AppError> {
        sqlx::query_as::<_, CampaignDetail>(DETAIL_SQL)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("campaign {}", id)))
    }

    async fn ensure_category(&self, category_id: i32) -> Result<(), AppError> {
        if !super::CategoryRepository::new(self.pool).exists(category_id).await? {
            return Err(AppError::Validation(format!("categoryId {} does not exist", category_id)));
        }
        Ok(())
    }

    pub async fn create(&self, owner: &AuthUser, req: &CreateCampaignRequest) -> Result<Campaign, AppError> {
        self.ensure_category(req.category_id).await?;
        let sql = format!(
            "INSERT INTO campaigns (id, owner_id, category_id, title, description, goal_amount, image_url, status, ends_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            CAMPAIGN_COLUMNS
        );
        let campaign = sqlx::query_as::<_, Campaign>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner.id)
            .bind(req.category_id)
            .bind(req.title.trim())
            .bind(req.description.trim())
            .bind(&req.goal_amount)
            .bind(req.image_url.as_deref().map(str::trim))
            .bind(CampaignStatus::Active.as_str())
            .bind(req.ends_at)
            .fetch_one(self.pool)
            .await?;
        tracing::info!(campaign = %campaign.id, owner = %owner.id, "campaign created");
        Ok(campaign)
    }

    /// Owner or admin. Goal may not drop below the amount already raised; reopening needs a future end date.
    pub async fn update(&self, actor: &AuthUser, id: Uuid, req: &UpdateCampaignRequest) -> Result<Campaign, AppError> {
        let current = self.get(id).await?;
        actor.ensure_can_manage(current.owner_id, "campaign")?;
        if req.is_empty() {
            return Ok(current);
        }
        if let Some(goal) = req.goal_amount.as_ref() {
            if goal < &current.amount_raised {
                return Err(AppError::Validation(format!(
                    "goalAmount cannot be below the amount already raised ({})",
                    current.amount_raised
                )));
            }
        }
        if let Some(category_id) = req.category_id {
            self.ensure_category(category_id).await?;
        }
        if req.status == Some(CampaignStatus::Active) && current.status != CampaignStatus::Active {
            let ends_at = req.ends_at.unwrap_or(current.ends_at);
            if ends_at <= Utc::now() {
                return Err(AppError::Validation("cannot reopen a campaign whose endsAt has passed".into()));
            }
        }

        let sql = format!(
            "UPDATE campaigns SET title = COALESCE($2, title), description = COALESCE($3, description), \
             goal_amount = COALESCE($4, goal_amount), category_id = COALESCE($5, category_id), \
             ends_at = COALESCE($6, ends_at), image_url = COALESCE($7, image_url), status = COALESCE($8, status), \
             updated_at = NOW() WHERE id = $1 AND ($4::numeric IS NULL OR $4 >= amount_raised) RETURNING {}",
            CAMPAIGN_COLUMNS
        );
        let updated = sqlx::query_as::<_, Campaign>(&sql)
            .bind(id)
            .bind(req.title.as_deref().map(str::trim))
            .bind(req.description.as_deref().map(str::trim))
            .bind(req.goal_amount.as_ref())
            .bind(req.category_id)
            .bind(req.ends_at)
            .bind(req.image_url.as_deref().map(str::trim))
            .bind(req.status.map(CampaignStatus::as_str))
            .fetch_optional(self.pool)
            .await?;
        match updated {
            Some(campaign) => Ok(campaign),
            // A pledge committed after the check above.
            None if req.goal_amount.is_some() && self.find(id).await?.is_some() => Err(AppError::Validation(
                "goalAmount cannot be below the amount already raised".into(),
            )),
            None => Err(AppError::NotFound(format!("campaign {}", id))),
        }
    }

    /// Owners may delete only campaigns without pledges; admins always. Pledges, payments and reviews cascade.
    /// The campaign row is locked first, so a pledge in flight either commits before the count or waits and then
    /// finds the campaign gone.
    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let (owner_id,): (Uuid,) = sqlx::query_as("SELECT owner_id FROM campaigns WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("campaign {}", id)))?;
        actor.ensure_can_manage(owner_id, "campaign")?;
        if !actor.is_admin() {
            let (pledges,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pledges WHERE campaign_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            if pledges > 0 {
                return Err(AppError::Conflict(
                    "campaign has pledges; cancel it instead of deleting".into(),
                ));
            }
        }
        sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(campaign = %id, actor = %actor.id, "campaign deleted");
        Ok(())
    }

    /// Move active campaigns whose end date has passed to `closed`. Returns how many changed.
    pub async fn close_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE campaigns SET status = 'closed', updated_at = NOW() WHERE status = 'active' AND ends_at <= NOW()",
        )
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
