//! Request extractors: authenticated caller and normalized query parameters.

pub mod auth;
pub mod query;

pub use auth::{AdminUser, AuthUser};
pub use query::ListParams;
