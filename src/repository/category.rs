use super::conflict_on_unique;
use crate::error::AppError;
use crate::models::{Category, CategoryRequest, CategoryWithCount};
use sqlx::PgPool;

pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, AppError> {
        Ok(sqlx::query_as::<_, CategoryWithCount>(
            "SELECT cat.id, cat.name, cat.description, cat.created_at, COUNT(c.id) AS campaign_count \
             FROM categories cat LEFT JOIN campaigns c ON c.category_id = cat.id \
             GROUP BY cat.id ORDER BY cat.name",
        )
        .fetch_all(self.pool)
        .await?)
    }

    pub async fn get(&self, id: i32) -> Result<CategoryWithCount, AppError> {
        sqlx::query_as::<_, CategoryWithCount>(
            "SELECT cat.id, cat.name, cat.description, cat.created_at, \
             (SELECT COUNT(*) FROM campaigns c WHERE c.category_id = cat.id) AS campaign_count \
             FROM categories cat WHERE cat.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {}", id)))
    }

    pub async fn exists(&self, id: i32) -> Result<bool, AppError> {
        let found: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(found.0)
    }

    pub async fn create(&self, req: &CategoryRequest) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id, name, description, created_at",
        )
        .bind(req.name.trim())
        .bind(req.description.as_deref().map(str::trim))
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category name already exists"))
    }

    pub async fn update(&self, id: i32, req: &CategoryRequest) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, description = $3 WHERE id = $1 \
             RETURNING id, name, description, created_at",
        )
        .bind(id)
        .bind(req.name.trim())
        .bind(req.description.as_deref().map(str::trim))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category name already exists"))?
        .ok_or_else(|| AppError::NotFound(format!("category {}", id)))
    }

    /// Refused with 409 while any campaign still uses the category.
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let category = self.get(id).await?;
        if category.campaign_count > 0 {
            return Err(AppError::Conflict(format!(
                "category is used by {} campaign(s)",
                category.campaign_count
            )));
        }
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Insert the default categories when the table is empty. Returns the number inserted.
    pub async fn seed_defaults(&self, defaults: &[(&str, &str)]) -> Result<u64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(self.pool)
            .await?;
        if count > 0 {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for (name, description) in defaults {
            inserted += sqlx::query("INSERT INTO categories (name, description) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
                .bind(name)
                .bind(description)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }
}
