use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::models::{
    to_minor_units, CreatePledgeRequest, PageRequest, Paged, Payment, PaymentStatus, Pledge,
    PledgeReceipt, PledgeSummary,
};
use crate::payment::{ChargeRequest, PaymentGateway};
use crate::sql::{bind_all, fetch_count, ListQuery, SortDirection};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

const SUMMARY_COLUMNS: &str = "p.id, p.campaign_id, p.backer_id, p.amount, p.message, p.created_at, \
    c.title AS campaign_title, c.owner_id AS campaign_owner_id, u.display_name AS backer_name, \
    pay.gateway_reference, pay.status AS payment_status";
const SUMMARY_FROM: &str = "pledges p JOIN campaigns c ON c.id = p.campaign_id \
    JOIN users u ON u.id = p.backer_id JOIN payments pay ON pay.pledge_id = p.id";

/// Optional narrowing for pledge listings.
#[derive(Clone, Debug, Default)]
pub struct PledgeFilter {
    pub campaign_id: Option<Uuid>,
    pub backer_id: Option<Uuid>,
}

pub struct PledgeRepository<'a> {
    pool: &'a PgPool,
    gateway: &'a dyn PaymentGateway,
    currency: &'a str,
}

impl<'a> PledgeRepository<'a> {
    pub fn new(pool: &'a PgPool, gateway: &'a dyn PaymentGateway, currency: &'a str) -> Self {
        PledgeRepository {
            pool,
            gateway,
            currency,
        }
    }

    /// Record a pledge and charge it.
    ///
    /// Pledge insert, `amount_raised` increment, gateway charge and payment insert share one
    /// transaction. The pledge id is the gateway idempotency key. Any error drops the
    /// transaction, which rolls it back, so a declined or failed charge leaves no rows and
    /// no change to the campaign total.
    pub async fn create(&self, backer: &AuthUser, req: &CreatePledgeRequest) -> Result<PledgeReceipt, AppError> {
        let campaign = super::CampaignRepository::new(self.pool).get(req.campaign_id).await?;
        if campaign.owner_id == backer.id {
            return Err(AppError::Forbidden("you cannot pledge to your own campaign".into()));
        }
        if !campaign.is_open(Utc::now()) {
            return Err(AppError::Conflict("campaign is not accepting pledges".into()));
        }
        let minor = to_minor_units(&req.amount)
            .ok_or_else(|| AppError::Validation("amount is out of range".into()))?;

        let pledge_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let pledge = sqlx::query_as::<_, Pledge>(
            "INSERT INTO pledges (id, campaign_id, backer_id, amount, message) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, campaign_id, backer_id, amount, message, created_at",
        )
        .bind(pledge_id)
        .bind(campaign.id)
        .bind(backer.id)
        .bind(&req.amount)
        .bind(req.message.as_deref().map(str::trim).filter(|m| !m.is_empty()))
        .fetch_one(&mut *tx)
        .await?;

        // Guarded increment; a campaign closed or expired since the check above matches no row.
        let bumped = sqlx::query(
            "UPDATE campaigns SET amount_raised = amount_raised + $1, updated_at = NOW() \
             WHERE id = $2 AND status = 'active' AND ends_at > NOW()",
        )
        .bind(&req.amount)
        .bind(campaign.id)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            return Err(AppError::Conflict("campaign is not accepting pledges".into()));
        }

        let charge = ChargeRequest {
            amount: minor,
            currency: self.currency.to_string(),
            source: req.payment_token.trim().to_string(),
            description: format!("Pledge to {}", campaign.title),
            idempotency_key: pledge_id.to_string(),
        };
        let receipt = match self.gateway.charge(&charge).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::warn!(pledge = %pledge_id, gateway = self.gateway.name(), error = %e, "charge failed");
                return Err(e.into());
            }
        };

        let payment = sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, pledge_id, gateway_reference, amount, currency, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, pledge_id, gateway_reference, amount, currency, status, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(pledge_id)
        .bind(&receipt.reference)
        .bind(&req.amount)
        .bind(self.currency)
        .bind(PaymentStatus::Succeeded.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            pledge = %pledge.id,
            campaign = %campaign.id,
            backer = %backer.id,
            reference = %payment.gateway_reference,
            "pledge recorded"
        );
        Ok(PledgeReceipt { pledge, payment })
    }

    /// Visible to the backer, the campaign owner and admins; anyone else sees 404.
    pub async fn find_visible(&self, actor: &AuthUser, id: Uuid) -> Result<PledgeSummary, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE p.id = $1", SUMMARY_COLUMNS, SUMMARY_FROM);
        let pledge = sqlx::query_as::<_, PledgeSummary>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("pledge {}", id)))?;
        let allowed = actor.is_admin() || pledge.pledge.backer_id == actor.id || pledge.campaign_owner_id == actor.id;
        if !allowed {
            return Err(AppError::NotFound(format!("pledge {}", id)));
        }
        Ok(pledge)
    }

    pub async fn list(&self, filter: &PledgeFilter, page: PageRequest) -> Result<Paged<PledgeSummary>, AppError> {
        let mut lq = ListQuery::new(SUMMARY_COLUMNS, SUMMARY_FROM);
        if let Some(campaign_id) = filter.campaign_id {
            lq.filter_eq("p.campaign_id", campaign_id);
        }
        if let Some(backer_id) = filter.backer_id {
            lq.filter_eq("p.backer_id", backer_id);
        }
        lq.order_by("p.created_at", SortDirection::Desc)
            .order_by("p.id", SortDirection::Asc);

        let total = fetch_count(self.pool, &lq.build_count()).await?;
        let q = lq.build_page(page.limit(), page.offset());
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let items = bind_all(sqlx::query_as::<_, PledgeSummary>(&q.sql), &q.params)
            .fetch_all(self.pool)
            .await?;
        Ok(Paged { items, total, page })
    }

    /// Pledges on one campaign; campaign owner or admin only.
    pub async fn list_for_campaign(
        &self,
        actor: &AuthUser,
        campaign_id: Uuid,
        page: PageRequest,
    ) -> Result<Paged<PledgeSummary>, AppError> {
        let campaign = super::CampaignRepository::new(self.pool).get(campaign_id).await?;
        if !actor.can_manage(campaign.owner_id) {
            return Err(AppError::Forbidden("only the campaign owner can view its pledges".into()));
        }
        let filter = PledgeFilter {
            campaign_id: Some(campaign_id),
            ..PledgeFilter::default()
        };
        self.list(&filter, page).await
    }
}
