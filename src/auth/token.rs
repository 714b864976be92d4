//! HS256 bearer tokens. Claims carry the user id and role, so a role change applies from the next login.

use crate::error::AppError;
use crate::models::{Role, User};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const ISSUER: &str = "crowdfund";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        TokenService {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            ttl: Duration::minutes(ttl_minutes.max(1)),
        }
    }

    /// Sign a token for `user`; returns the token and its expiry.
    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: ISSUER.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))?;
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AppError::Unauthorized("invalid or expired token".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "owner@example.com".into(),
            display_name: "Owner".into(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let svc = TokenService::new("a-test-secret-of-decent-length", 60);
        let u = user(Role::Admin);
        let (token, exp) = svc.issue(&u).unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp, exp.timestamp());
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let a = TokenService::new("first-secret-0123456789", 60);
        let b = TokenService::new("second-secret-0123456789", 60);
        let (token, _) = a.issue(&user(Role::User)).unwrap();
        assert!(matches!(b.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = TokenService::new("a-test-secret-of-decent-length", 5);
        let (token, _) = svc.issue_at(&user(Role::User), Utc::now() - Duration::hours(2)).unwrap();
        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let svc = TokenService::new("a-test-secret-of-decent-length", 5);
        assert!(svc.verify("not.a.jwt").is_err());
    }
}
