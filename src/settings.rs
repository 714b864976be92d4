//! Runtime settings read from the environment (`.env` is loaded by the binary via dotenvy).

use crate::error::ConfigError;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    /// When unset the simulated gateway is used.
    pub payment_gateway_url: Option<String>,
    pub payment_gateway_api_key: Option<String>,
    pub payment_currency: String,
    pub static_dir: PathBuf,
    pub cors_origin: Option<String>,
    pub expiry_sweep_secs: u64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

const DEV_JWT_SECRET: &str = "crowdfund-dev-secret-change-me";

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = match get("JWT_SECRET") {
            Some(s) if s.len() < 16 => {
                return Err(ConfigError::Invalid {
                    key: "JWT_SECRET",
                    message: "must be at least 16 characters".into(),
                })
            }
            Some(s) => s,
            None => {
                tracing::warn!("JWT_SECRET not set, using development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let admin_email = get("ADMIN_EMAIL");
        let admin_password = get("ADMIN_PASSWORD");
        if admin_email.is_some() != admin_password.is_some() {
            return Err(ConfigError::Invalid {
                key: "ADMIN_PASSWORD",
                message: "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".into(),
            });
        }

        Ok(Settings {
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            db_max_connections: positive(parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5)?, "DB_MAX_CONNECTIONS")?,
            jwt_secret,
            jwt_ttl_minutes: parse_or(get("JWT_TTL_MINUTES"), "JWT_TTL_MINUTES", 24 * 60)?,
            payment_gateway_url: get("PAYMENT_GATEWAY_URL").map(|u| u.trim_end_matches('/').to_string()),
            payment_gateway_api_key: get("PAYMENT_GATEWAY_API_KEY"),
            payment_currency: get("PAYMENT_CURRENCY").unwrap_or_else(|| "usd".into()).to_lowercase(),
            static_dir: PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "wwwroot".into())),
            cors_origin: get("CORS_ORIGIN"),
            expiry_sweep_secs: positive(parse_or(get("EXPIRY_SWEEP_SECS"), "EXPIRY_SWEEP_SECS", 300)?, "EXPIRY_SWEEP_SECS")?,
            admin_email,
            admin_password,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn positive<T>(value: T, key: &'static str) -> Result<T, ConfigError>
where
    T: PartialEq + Default,
{
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key,
            message: "must be greater than 0".into(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let s = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/crowdfund")])).unwrap();
        assert_eq!(s.bind_addr, "0.0.0.0:3000");
        assert_eq!(s.db_max_connections, 5);
        assert_eq!(s.jwt_ttl_minutes, 1440);
        assert_eq!(s.payment_currency, "usd");
        assert!(s.payment_gateway_url.is_none());
        assert_eq!(s.static_dir, PathBuf::from("wwwroot"));
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn rejects_unparsable_numbers_and_short_secrets() {
        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", .. }));

        let err = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://x/y"), ("JWT_SECRET", "short")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "JWT_SECRET", .. }));
    }

    #[test]
    fn admin_credentials_must_come_in_pairs() {
        let err = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://x/y"), ("ADMIN_EMAIL", "a@b.io")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ADMIN_PASSWORD", .. }));
    }

    #[test]
    fn gateway_url_loses_trailing_slash() {
        let s = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("PAYMENT_GATEWAY_URL", "https://pay.example.com/"),
            ("PAYMENT_CURRENCY", "EUR"),
        ]))
        .unwrap();
        assert_eq!(s.payment_gateway_url.as_deref(), Some("https://pay.example.com"));
        assert_eq!(s.payment_currency, "eur");
    }

    #[test]
    fn zero_pool_size_or_sweep_interval_is_rejected() {
        for key in ["DB_MAX_CONNECTIONS", "EXPIRY_SWEEP_SECS"] {
            let err = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://x/y"), (key, "0")])).unwrap_err();
            match err {
                ConfigError::Invalid { key: k, message } => {
                    assert_eq!(k, key);
                    assert!(message.contains("greater than 0"));
                }
                other => panic!("unexpected error for {key}: {other}"),
            }
        }
    }
}
