use super::conflict_on_unique;
use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::models::{CreateReviewRequest, PageRequest, Paged, Review, ReviewView, UpdateReviewRequest};
use crate::sql::{bind_all, fetch_count, ListQuery, SortDirection};
use sqlx::PgPool;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, campaign_id, author_id, rating, comment, created_at, updated_at";
const VIEW_COLUMNS: &str = "r.id, r.campaign_id, r.author_id, r.rating, r.comment, r.created_at, r.updated_at, \
    u.display_name AS author_name";
const VIEW_FROM: &str = "reviews r JOIN users u ON u.id = r.author_id";

pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        ReviewRepository { pool }
    }

    pub async fn list_for_campaign(&self, campaign_id: Uuid, page: PageRequest) -> Result<Paged<ReviewView>, AppError> {
        // 404 for an unknown campaign rather than an empty page.
        super::CampaignRepository::new(self.pool).get(campaign_id).await?;

        let mut lq = ListQuery::new(VIEW_COLUMNS, VIEW_FROM);
        lq.filter_eq("r.campaign_id", campaign_id)
            .order_by("r.created_at", SortDirection::Desc)
            .order_by("r.id", SortDirection::Asc);
        let total = fetch_count(self.pool, &lq.build_count()).await?;
        let q = lq.build_page(page.limit(), page.offset());
        let items = bind_all(sqlx::query_as::<_, ReviewView>(&q.sql), &q.params)
            .fetch_all(self.pool)
            .await?;
        Ok(Paged { items, total, page })
    }

    /// One review per author per campaign; owners cannot review their own campaign.
    pub async fn create(&self, author: &AuthUser, campaign_id: Uuid, req: &CreateReviewRequest) -> Result<Review, AppError> {
        let campaign = super::CampaignRepository::new(self.pool).get(campaign_id).await?;
        if campaign.owner_id == author.id {
            return Err(AppError::Forbidden("you cannot review your own campaign".into()));
        }
        let sql = format!(
            "INSERT INTO reviews (id, campaign_id, author_id, rating, comment) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            REVIEW_COLUMNS
        );
        sqlx::query_as::<_, Review>(&sql)
            .bind(Uuid::new_v4())
            .bind(campaign_id)
            .bind(author.id)
            .bind(req.rating)
            .bind(req.comment.trim())
            .fetch_one(self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "you have already reviewed this campaign"))
    }

    pub async fn get(&self, id: Uuid) -> Result<ReviewView, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE r.id = $1", VIEW_COLUMNS, VIEW_FROM);
        sqlx::query_as::<_, ReviewView>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("review {}", id)))
    }

    /// Only the author may edit.
    pub async fn update(&self, actor: &AuthUser, id: Uuid, req: &UpdateReviewRequest) -> Result<Review, AppError> {
        let current = self.get(id).await?;
        if current.review.author_id != actor.id {
            return Err(AppError::Forbidden("only the author can edit this review".into()));
        }
        let sql = format!(
            "UPDATE reviews SET rating = COALESCE($2, rating), comment = COALESCE($3, comment), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            REVIEW_COLUMNS
        );
        sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(req.rating)
            .bind(req.comment.as_deref().map(str::trim))
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("review {}", id)))
    }

    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> Result<(), AppError> {
        let current = self.get(id).await?;
        actor.ensure_can_manage(current.review.author_id, "review")?;
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
