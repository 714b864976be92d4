use super::{CampaignSummary, Category};
use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_users: i64,
    pub total_campaigns: i64,
    pub active_campaigns: i64,
    pub funded_campaigns: i64,
    pub total_pledges: i64,
    pub total_raised: BigDecimal,
    pub average_pledge: BigDecimal,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category_id: i32,
    pub category_name: String,
    pub campaign_count: i64,
    pub amount_raised: BigDecimal,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopCampaign {
    pub id: Uuid,
    pub title: String,
    pub goal_amount: BigDecimal,
    pub amount_raised: BigDecimal,
    pub pledge_count: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(flatten)]
    pub totals: Totals,
    pub by_category: Vec<CategoryStat>,
    pub top_campaigns: Vec<TopCampaign>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResults {
    pub campaigns: Vec<CampaignSummary>,
    pub categories: Vec<Category>,
}
