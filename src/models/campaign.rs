use super::UnknownVariant;
use crate::error::AppError;
use crate::validation::{check_amount, check_length, check_url};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Closed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Closed => "closed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(CampaignStatus::Active),
            "closed" => Ok(CampaignStatus::Closed),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            _ => Err(UnknownVariant {
                kind: "campaign status",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for CampaignStatus {
    type Error = UnknownVariant;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Upper bound for a goal or a single pledge.
pub fn max_amount() -> BigDecimal {
    BigDecimal::from(1_000_000)
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: i32,
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub goal_amount: BigDecimal,
    pub amount_raised: BigDecimal,
    pub image_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: CampaignStatus,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Accepting pledges: active and not past its end date.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active && self.ends_at > now
    }
}

/// List item: campaign plus joined names and pledge aggregates.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub campaign: Campaign,
    pub owner_name: String,
    pub category_name: String,
    pub pledge_count: i64,
    /// Percent of goal raised, two decimals.
    pub progress: BigDecimal,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub summary: CampaignSummary,
    pub average_rating: Option<BigDecimal>,
    pub review_count: i64,
}

/// Sortable columns for campaign lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CampaignSort {
    #[default]
    CreatedAt,
    Title,
    GoalAmount,
    AmountRaised,
    EndsAt,
    Progress,
}

impl CampaignSort {
    /// Accepts camelCase, PascalCase or snake_case names; unknown keys yield None.
    pub fn parse(s: &str) -> Option<Self> {
        match crate::case::to_snake_case(s.trim()).as_str() {
            "created_at" | "created" | "newest" => Some(CampaignSort::CreatedAt),
            "title" => Some(CampaignSort::Title),
            "goal_amount" | "goal" => Some(CampaignSort::GoalAmount),
            "amount_raised" | "raised" => Some(CampaignSort::AmountRaised),
            "ends_at" | "deadline" => Some(CampaignSort::EndsAt),
            "progress" => Some(CampaignSort::Progress),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            CampaignSort::CreatedAt => "c.created_at",
            CampaignSort::Title => "LOWER(c.title)",
            CampaignSort::GoalAmount => "c.goal_amount",
            CampaignSort::AmountRaised => "c.amount_raised",
            CampaignSort::EndsAt => "c.ends_at",
            CampaignSort::Progress => "(c.amount_raised / c.goal_amount)",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CampaignFilter {
    pub category_id: Option<i32>,
    pub status: Option<CampaignStatus>,
    pub owner_id: Option<Uuid>,
    pub search: Option<String>,
    pub min_goal: Option<BigDecimal>,
    pub max_goal: Option<BigDecimal>,
    pub sort: CampaignSort,
    pub direction: crate::sql::SortDirection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub goal_amount: BigDecimal,
    pub category_id: i32,
    pub ends_at: DateTime<Utc>,
    pub image_url: Option<String>,
}

impl CreateCampaignRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        check_length("title", &self.title, 3, 200)?;
        check_length("description", &self.description, 1, 5000)?;
        check_amount("goalAmount", &self.goal_amount, &max_amount())?;
        if self.ends_at <= now {
            return Err(AppError::Validation("endsAt must be in the future".into()));
        }
        if let Some(url) = self.image_url.as_deref() {
            check_url("imageUrl", url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "super::money::deserialize_optional")]
    pub goal_amount: Option<BigDecimal>,
    pub category_id: Option<i32>,
    pub ends_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub status: Option<CampaignStatus>,
}

impl UpdateCampaignRequest {
    /// Checks fields present in the body; cross-field checks against the stored row happen in the repository.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(t) = self.title.as_deref() {
            check_length("title", t, 3, 200)?;
        }
        if let Some(d) = self.description.as_deref() {
            check_length("description", d, 1, 5000)?;
        }
        if let Some(g) = self.goal_amount.as_ref() {
            check_amount("goalAmount", g, &max_amount())?;
        }
        if let Some(e) = self.ends_at {
            if e <= now {
                return Err(AppError::Validation("endsAt must be in the future".into()));
            }
        }
        if let Some(url) = self.image_url.as_deref() {
            check_url("imageUrl", url)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.goal_amount.is_none()
            && self.category_id.is_none()
            && self.ends_at.is_none()
            && self.image_url.is_none()
            && self.status.is_none()
    }
}
