//! Category repository.

use sqlx::PgPool;

use freshmart_core::{CategoryId, Slug};

use super::{RepositoryError, count};
use crate::models::{Category, CategoryInput};

const CATEGORY_SELECT: &str = "
    SELECT c.id, c.name, c.slug, c.description, c.image_url, c.sort_order,
           (SELECT COUNT(*) FROM shop.product p
             WHERE p.category_id = c.id AND p.is_active) AS product_count
    FROM shop.category c";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    image_url: Option<String>,
    sort_order: i32,
    product_count: i64,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category slug in database: {e}"))
        })?;

        Ok(Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug,
            description: row.description,
            image_url: row.image_url,
            sort_order: row.sort_order,
            product_count: count(row.product_count),
        })
    }
}

/// Resolve the slug for a category input, deriving it from the name if needed.
///
/// # Errors
///
/// Returns a message if neither the given slug nor the name yields a valid slug.
pub fn resolve_slug(explicit: Option<&str>, name: &str) -> Result<Slug, String> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Slug::parse(s).map_err(|e| format!("invalid slug: {e}")),
        None => Slug::from_name(name).map_err(|e| format!("cannot derive slug from name: {e}")),
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "{CATEGORY_SELECT} ORDER BY c.sort_order, c.name"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        input: &CategoryInput,
        slug: &Slug,
    ) -> Result<Category, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.category (name, slug, description, image_url, sort_order)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(input.name.trim())
        .bind(slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.sort_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "category slug already exists"))?;

        self.get_by_id(CategoryId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
        slug: &Slug,
    ) -> Result<Category, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.category
             SET name = $2, slug = $3, description = $4, image_url = $5, sort_order = $6
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.sort_order)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "category slug already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category. Its products become uncategorised.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert or update by slug, for seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        input: &CategoryInput,
        slug: &Slug,
    ) -> Result<CategoryId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.category (name, slug, description, image_url, sort_order)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (slug) DO UPDATE
             SET name = EXCLUDED.name, description = EXCLUDED.description,
                 image_url = EXCLUDED.image_url, sort_order = EXCLUDED.sort_order
             RETURNING id",
        )
        .bind(input.name.trim())
        .bind(slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.sort_order)
        .fetch_one(self.pool)
        .await?;

        Ok(CategoryId::new(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug(None, "Fresh Fruit").unwrap().as_str(), "fresh-fruit");
        assert_eq!(resolve_slug(Some("  "), "Dairy & Eggs").unwrap().as_str(), "dairy-eggs");
        assert_eq!(resolve_slug(Some("bakery"), "Bread").unwrap().as_str(), "bakery");
        assert!(resolve_slug(Some("Not A Slug"), "x").is_err());
        assert!(resolve_slug(None, "!!!").is_err());
    }
}
