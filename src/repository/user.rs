use super::conflict_on_unique;
use crate::error::AppError;
use crate::models::{PageRequest, Paged, Role, User, UserRecord};
use crate::sql::{bind_all, fetch_count, ListQuery, SortDirection};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, display_name, role, created_at";
const RECORD_COLUMNS: &str = "id, email, display_name, password_hash, role, created_at, updated_at";

pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        UserRepository { pool }
    }

    /// Insert a user; a duplicate email (case-insensitive) is a 409.
    pub async fn create(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, email, display_name, password_hash, role) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(email.trim().to_lowercase())
            .bind(display_name.trim())
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email is already registered"))
    }

    pub async fn find_record_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", RECORD_COLUMNS);
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email.trim())
            .fetch_optional(self.pool)
            .await?)
    }

    pub async fn find_record(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", RECORD_COLUMNS);
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    /// Paginated, newest first; `search` matches email or display name.
    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Paged<User>, AppError> {
        let mut lq = ListQuery::new(USER_COLUMNS, "users");
        if let Some(term) = search {
            lq.filter_contains_any(&["email", "display_name"], term);
        }
        lq.order_by("created_at", SortDirection::Desc)
            .order_by("id", SortDirection::Asc);

        let total = fetch_count(self.pool, &lq.build_count()).await?;
        let q = lq.build_page(page.limit(), page.offset());
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let items = bind_all(sqlx::query_as::<_, User>(&q.sql), &q.params)
            .fetch_all(self.pool)
            .await?;
        Ok(Paged { items, total, page })
    }

    /// Update name and/or password hash; absent fields keep their value.
    pub async fn update_profile(
        &self,
        id: Uuid,
        display_name: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET display_name = COALESCE($2, display_name), password_hash = COALESCE($3, password_hash), \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(display_name.map(str::trim))
            .bind(password_hash)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    /// Delete a user; their campaigns, pledges and reviews cascade.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    /// Create the bootstrap admin if no user has this email. Returns true when created.
    pub async fn ensure_admin(&self, email: &str, password_hash: &str) -> Result<bool, AppError> {
        if self.find_record_by_email(email).await?.is_some() {
            return Ok(false);
        }
        self.create(email, "Administrator", password_hash, Role::Admin).await?;
        Ok(true)
    }
}
