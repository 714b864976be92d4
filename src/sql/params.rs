//! Values bound into dynamically assembled queries.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query built at runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    Decimal(BigDecimal),
    Text(String),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
}

impl From<i32> for PgBindValue {
    fn from(v: i32) -> Self {
        PgBindValue::I32(v)
    }
}

impl From<i64> for PgBindValue {
    fn from(v: i64) -> Self {
        PgBindValue::I64(v)
    }
}

impl From<bool> for PgBindValue {
    fn from(v: bool) -> Self {
        PgBindValue::Bool(v)
    }
}

impl From<String> for PgBindValue {
    fn from(v: String) -> Self {
        PgBindValue::Text(v)
    }
}

impl From<&str> for PgBindValue {
    fn from(v: &str) -> Self {
        PgBindValue::Text(v.to_string())
    }
}

impl From<uuid::Uuid> for PgBindValue {
    fn from(v: uuid::Uuid) -> Self {
        PgBindValue::Uuid(v)
    }
}

impl From<BigDecimal> for PgBindValue {
    fn from(v: BigDecimal) -> Self {
        PgBindValue::Decimal(v)
    }
}

impl From<DateTime<Utc>> for PgBindValue {
    fn from(v: DateTime<Utc>) -> Self {
        PgBindValue::Timestamp(v)
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            PgBindValue::Null => Ok(IsNull::Yes),
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            PgBindValue::I32(n) => <i32 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::Decimal(d) => <BigDecimal as Encode<Postgres>>::encode_by_ref(d, buf),
            PgBindValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf),
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf),
            PgBindValue::Timestamp(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(t, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null | PgBindValue::Text(_) => <String as Type<Postgres>>::type_info(),
            PgBindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            PgBindValue::I32(_) => <i32 as Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::Decimal(_) => <BigDecimal as Type<Postgres>>::type_info(),
            PgBindValue::Uuid(_) => <uuid::Uuid as Type<Postgres>>::type_info(),
            PgBindValue::Timestamp(_) => <DateTime<Utc> as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}
