//! Cached catalog reads.
//!
//! The category list is read on every page of the SPA, so it is kept in an
//! in-process cache for a minute. Product queries are not cached; stock
//! changes with every order.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use freshmart_db::models::Category;
use freshmart_db::{CategoryRepository, RepositoryError};

/// How long cached categories are served before being reloaded.
const CATEGORY_TTL: Duration = Duration::from_secs(60);

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
}

/// In-process cache in front of [`CategoryRepository`].
#[derive(Clone)]
pub struct CatalogCache {
    categories: Cache<CacheKey, Arc<Vec<Category>>>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_TTL)
            .build();
        Self { categories }
    }

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the categories have to be loaded and the query fails.
    #[instrument(skip(self, pool))]
    pub async fn categories(&self, pool: &PgPool) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(categories) = self.categories.get(&CacheKey::Categories).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(CategoryRepository::new(pool).list().await?);
        self.categories
            .insert(CacheKey::Categories, Arc::clone(&categories))
            .await;
        Ok(categories)
    }

    /// A single category, served from the cached list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the categories have to be loaded and the query fails.
    pub async fn category(
        &self,
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let categories = self.categories(pool).await?;
        Ok(categories.iter().find(|c| c.slug.as_str() == slug).cloned())
    }
}
