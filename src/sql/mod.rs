//! Safe SQL builder: identifiers from code only, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;

/// Bind every parameter of a built query onto a `query_as`.
pub fn bind_all<'q, O>(
    mut query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    params: &[PgBindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for p in params {
        query = query.bind(p.clone());
    }
    query
}

/// Run the count half of a list query.
pub async fn fetch_count(pool: &sqlx::PgPool, q: &QueryBuf) -> Result<i64, sqlx::Error> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "count");
    let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query.fetch_one(pool).await
}
