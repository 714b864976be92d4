use super::UnknownVariant;
use crate::auth::check_password_policy;
use crate::error::AppError;
use crate::validation::{check_email, check_length};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Full users row, including the password hash. Never serialized.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        User {
            id: r.id,
            email: r.email,
            display_name: r.display_name,
            role: r.role,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_email("email", &self.email)?;
        check_password_policy(&self.password)?;
        check_length("displayName", &self.display_name, 1, 100)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.display_name.is_none() && self.password.is_none() {
            return Err(AppError::BadRequest("nothing to update".into()));
        }
        if let Some(name) = self.display_name.as_deref() {
            check_length("displayName", name, 1, 100)?;
        }
        if let Some(password) = self.password.as_deref() {
            check_password_policy(password)?;
            if self.current_password.as_deref().map_or(true, str::is_empty) {
                return Err(AppError::Validation("currentPassword is required to change the password".into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn register_checks_each_field() {
        let ok = RegisterRequest {
            email: "ada@example.com".into(),
            password: "correct horse".into(),
            display_name: "Ada".into(),
        };
        assert!(ok.validate().is_ok());
        let short = RegisterRequest { password: "short".into(), ..ok };
        assert!(matches!(short.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn password_change_needs_current_password() {
        let req = UpdateProfileRequest {
            password: Some("a new password".into()),
            ..Default::default()
        };
        assert!(req.validate().unwrap_err().to_string().contains("currentPassword"));
        assert!(matches!(UpdateProfileRequest::default().validate(), Err(AppError::BadRequest(_))));
    }
}
