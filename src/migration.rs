//! Schema DDL, applied at startup. Every statement is idempotent, so restarts re-run it safely.
//! Order follows foreign-key dependencies: users, categories, campaigns, pledges, payments, reviews.

use crate::error::AppError;
use sqlx::PgPool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        display_name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_idx ON users (LOWER(email))",
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS campaigns (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        category_id INTEGER NOT NULL REFERENCES categories (id),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        goal_amount NUMERIC(12, 2) NOT NULL CHECK (goal_amount > 0),
        amount_raised NUMERIC(12, 2) NOT NULL DEFAULT 0 CHECK (amount_raised >= 0),
        image_url TEXT,
        status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'closed', 'cancelled')),
        ends_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS campaigns_owner_idx ON campaigns (owner_id)",
    "CREATE INDEX IF NOT EXISTS campaigns_category_idx ON campaigns (category_id)",
    "CREATE INDEX IF NOT EXISTS campaigns_status_ends_idx ON campaigns (status, ends_at)",
    r#"
    CREATE TABLE IF NOT EXISTS pledges (
        id UUID PRIMARY KEY,
        campaign_id UUID NOT NULL REFERENCES campaigns (id) ON DELETE CASCADE,
        backer_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        amount NUMERIC(12, 2) NOT NULL CHECK (amount > 0),
        message TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS pledges_campaign_idx ON pledges (campaign_id)",
    "CREATE INDEX IF NOT EXISTS pledges_backer_idx ON pledges (backer_id)",
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id UUID PRIMARY KEY,
        pledge_id UUID NOT NULL UNIQUE REFERENCES pledges (id) ON DELETE CASCADE,
        gateway_reference TEXT NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        currency TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('succeeded', 'failed')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id UUID PRIMARY KEY,
        campaign_id UUID NOT NULL REFERENCES campaigns (id) ON DELETE CASCADE,
        author_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
        comment TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (campaign_id, author_id)
    )
    "#,
];

/// Seeded into an empty `categories` table.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Technology", "Gadgets, software and hardware projects"),
    ("Art", "Painting, sculpture, illustration and installations"),
    ("Music", "Albums, tours and instruments"),
    ("Film", "Features, shorts and documentaries"),
    ("Games", "Video, tabletop and card games"),
    ("Community", "Local initiatives and neighbourhood projects"),
    ("Health", "Medical causes and wellbeing"),
    ("Education", "Schools, courses and learning resources"),
];

/// Advisory lock key held while the schema is applied.
const MIGRATION_LOCK: i64 = 0x6372_6f77_6466_756e;

/// Create all tables and indexes that do not exist yet, in one transaction.
/// Concurrent callers (several instances starting at once) serialize on an advisory lock.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK)
        .execute(&mut *tx)
        .await?;
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(statements = SCHEMA.len(), "schema up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_precede_their_dependents() {
        let pos = |needle: &str| {
            SCHEMA
                .iter()
                .position(|s| s.contains(needle))
                .unwrap_or_else(|| panic!("{} missing", needle))
        };
        assert!(pos("TABLE IF NOT EXISTS users") < pos("TABLE IF NOT EXISTS campaigns"));
        assert!(pos("TABLE IF NOT EXISTS categories") < pos("TABLE IF NOT EXISTS campaigns"));
        assert!(pos("TABLE IF NOT EXISTS campaigns") < pos("TABLE IF NOT EXISTS pledges"));
        assert!(pos("TABLE IF NOT EXISTS pledges") < pos("TABLE IF NOT EXISTS payments"));
    }

    #[test]
    fn default_categories_are_unique() {
        let mut names: Vec<&str> = DEFAULT_CATEGORIES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_CATEGORIES.len());
    }
}
