use crate::error::AppError;
use crate::validation::{check_length, check_range};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub author_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub author_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    pub comment: String,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_range("rating", i64::from(self.rating), 1, 5)?;
        check_length("comment", &self.comment, 1, 2000)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

impl UpdateReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.rating.is_none() && self.comment.is_none() {
            return Err(AppError::BadRequest("nothing to update".into()));
        }
        if let Some(r) = self.rating {
            check_range("rating", i64::from(r), 1, 5)?;
        }
        if let Some(c) = self.comment.as_deref() {
            check_length("comment", c, 1, 2000)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        let ok = CreateReviewRequest { rating: 4, comment: "Great team".into() };
        assert!(ok.validate().is_ok());
        let bad = CreateReviewRequest { rating: 6, comment: "Great team".into() };
        assert!(bad.validate().is_err());
        assert!(UpdateReviewRequest::default().validate().is_err());
    }
}
