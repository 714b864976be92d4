//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

/// Envelope for one page of a larger result set.
#[derive(Serialize)]
pub struct SuccessPage<T> {
    pub data: T,
    pub meta: PageMeta,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(count: usize, page: u32, page_size: u32, total_count: i64) -> Self {
        let size = i64::from(page_size.max(1));
        PageMeta {
            count: count as u64,
            page,
            page_size,
            total_count,
            total_pages: (total_count + size - 1) / size,
        }
    }
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::CREATED,
        Json(SuccessOne {
            data,
            meta: None,
        }),
    )
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::OK,
        Json(SuccessOne {
            data,
            meta: None,
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}

pub fn success_page<T: Serialize>(data: T, meta: PageMeta) -> (StatusCode, Json<SuccessPage<T>>) {
    (StatusCode::OK, Json(SuccessPage { data, meta }))
}
