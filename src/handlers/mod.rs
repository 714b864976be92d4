//! HTTP handlers, one module per resource. Bodies are validated before any database access.

pub mod admin;
pub mod auth;
pub mod campaigns;
pub mod categories;
pub mod pledges;
pub mod reviews;
pub mod search;
pub mod users;
