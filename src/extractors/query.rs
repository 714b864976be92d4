//! Query-string parameters with keys normalized to snake_case and typed lookups.

use crate::case::hashmap_keys_to_snake_case;
use crate::error::AppError;
use crate::models::PageRequest;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Clone, Debug, Default)]
pub struct ListParams(pub HashMap<String, String>);

impl ListParams {
    /// Trimmed, non-empty value for a snake_case key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    /// Parse a present value; a present but unparsable value is a 400.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("invalid value for {}: {}", key, raw))),
        }
    }

    pub fn page(&self) -> Result<PageRequest, AppError> {
        Ok(PageRequest::new(self.parse("page")?, self.parse("page_size")?))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(ListParams(hashmap_keys_to_snake_case(raw)))
    }
}
