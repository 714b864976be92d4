use crate::error::AppError;
use crate::validation::{check_length, check_optional_length};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    pub campaign_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_length("name", &self.name, 2, 100)?;
        check_optional_length("description", self.description.as_deref(), 1000)
    }
}
