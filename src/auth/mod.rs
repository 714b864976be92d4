//! Password hashing and bearer tokens.

pub mod password;
pub mod token;

pub use password::{check_password_policy, hash_password_blocking, verify_password_blocking};
pub use token::{Claims, TokenService};
