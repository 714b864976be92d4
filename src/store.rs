//! Database bootstrap: create the target database if missing, then open the shared pool.

use crate::error::{AppError, ConfigError};
use crate::settings::Settings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url).map_err(|e| ConfigError::Invalid {
        key: "DATABASE_URL",
        message: e.to_string(),
    })?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

/// Open the shared pool sized by `DB_MAX_CONNECTIONS`.
pub async fn connect(settings: &Settings) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&settings.database_url)
        .await?;
    Ok(pool)
}

/// Round-trip to the database; used by the readiness probe.
pub async fn ping(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let invalid = |message: &str| ConfigError::Invalid {
        key: "DATABASE_URL",
        message: message.to_string(),
    };
    let scheme_end = url.find("://").ok_or_else(|| invalid("missing scheme"))? + 3;
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| invalid("no database path"))?;
    let path_and_query = &url[path_start..];
    let (db_name, query) = match path_and_query.split_once('?') {
        Some((name, q)) => (name.trim(), Some(q)),
        None => (path_and_query.trim(), None),
    };
    let mut admin_url = format!("{}postgres", &url[..path_start]);
    if let Some(q) = query {
        admin_url.push('?');
        admin_url.push_str(q);
    }
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name_from_url() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/crowdfund").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "crowdfund");
    }

    #[test]
    fn keeps_query_on_admin_url() {
        let (admin, name) = parse_db_name_from_url("postgres://localhost/crowd?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://localhost/postgres?sslmode=disable");
        assert_eq!(name, "crowd");
    }

    #[test]
    fn url_without_path_is_rejected() {
        assert!(parse_db_name_from_url("postgres://localhost:5432").is_err());
        assert!(parse_db_name_from_url("not a url").is_err());
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("crowd\"fund"), "\"crowd\"\"fund\"");
    }
}
