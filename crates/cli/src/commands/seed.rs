//! Catalog seeding from a YAML file.
//!
//! ```bash
//! fm-cli seed crates/cli/seed/catalog.yaml
//! ```
//!
//! Categories and products are upserted by slug, so the command can be run
//! again after editing the file. Products name their category by slug.
//!
//! ```yaml
//! categories:
//!   - name: Fresh Fruit
//!     slug: fruit            # optional, derived from the name
//! products:
//!   - name: Bananas
//!     category: fruit
//!     unit: bunch
//!     price: "1.29"
//!     discount_percent: 10
//!     stock: 120
//! ```

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use freshmart_core::pricing::DiscountPercent;
use freshmart_core::{CategoryId, ProductUnit, Slug};
use freshmart_db::categories::resolve_slug;
use freshmart_db::models::{CategoryInput, ProductInput};
use freshmart_db::{CategoryRepository, ProductRepository};

use super::{CliError, connect};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub slug: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub unit: ProductUnit,
    pub price: Decimal,
    #[serde(default)]
    pub discount_percent: DiscountPercent,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// A seed catalog whose slugs and references have been checked.
#[derive(Debug)]
pub struct ValidatedCatalog {
    categories: Vec<(CategoryInput, Slug)>,
    /// Product input (without category id), its slug and its category slug.
    products: Vec<(ProductInput, Slug, Option<Slug>)>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

impl SeedProduct {
    fn input(&self) -> ProductInput {
        ProductInput {
            category_id: None,
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            unit: self.unit,
            price: self.price,
            discount_percent: self.discount_percent,
            stock: self.stock,
            is_active: self.is_active,
            is_featured: self.is_featured,
        }
    }
}

impl Catalog {
    /// Check every entry, collecting all problems rather than stopping at the first.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidSeed` listing each problem found.
    pub fn validate(self) -> Result<ValidatedCatalog, CliError> {
        let mut errors = Vec::new();
        let mut category_slugs: Vec<Slug> = Vec::new();
        let mut categories = Vec::with_capacity(self.categories.len());

        for (i, c) in self.categories.into_iter().enumerate() {
            if c.name.trim().is_empty() {
                errors.push(format!("categories[{i}]: name is required"));
                continue;
            }
            match resolve_slug(c.slug.as_deref(), &c.name) {
                Ok(slug) if category_slugs.contains(&slug) => {
                    errors.push(format!("categories[{i}]: duplicate slug '{slug}'"));
                }
                Ok(slug) => {
                    category_slugs.push(slug.clone());
                    let input = CategoryInput {
                        name: c.name,
                        slug: c.slug,
                        description: c.description,
                        image_url: c.image_url,
                        sort_order: c.sort_order,
                    };
                    categories.push((input, slug));
                }
                Err(e) => errors.push(format!("categories[{i}]: {e}")),
            }
        }

        let mut product_slugs: Vec<Slug> = Vec::new();
        let mut products = Vec::with_capacity(self.products.len());
        for (i, p) in self.products.iter().enumerate() {
            let input = p.input();
            if let Err(e) = input.validate() {
                errors.push(format!("products[{i}] ({}): {e}", p.name));
                continue;
            }
            let slug = match resolve_slug(p.slug.as_deref(), &p.name) {
                Ok(slug) if product_slugs.contains(&slug) => {
                    errors.push(format!("products[{i}]: duplicate slug '{slug}'"));
                    continue;
                }
                Ok(slug) => slug,
                Err(e) => {
                    errors.push(format!("products[{i}]: {e}"));
                    continue;
                }
            };
            let category = match p.category.as_deref().map(Slug::parse) {
                None => None,
                Some(Ok(c)) if category_slugs.contains(&c) => Some(c),
                Some(_) => {
                    errors.push(format!(
                        "products[{i}] ({}): unknown category '{}'",
                        p.name,
                        p.category.as_deref().unwrap_or_default()
                    ));
                    continue;
                }
            };
            product_slugs.push(slug.clone());
            products.push((input, slug, category));
        }

        if errors.is_empty() {
            Ok(ValidatedCatalog {
                categories,
                products,
            })
        } else {
            Err(CliError::InvalidSeed(errors))
        }
    }
}

/// Parse and validate a catalog file without touching the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid YAML, or fails
/// validation.
pub async fn load(path: &Path) -> Result<ValidatedCatalog, CliError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let catalog: Catalog = serde_yaml::from_str(&content)?;
    catalog.validate()
}

/// Upsert the catalog in `path`.
///
/// # Errors
///
/// Returns an error if the file is invalid or a database write fails.
pub async fn run(path: &Path) -> Result<SeedSummary, CliError> {
    tracing::info!(path = %path.display(), "Loading catalog");
    let catalog = load(path).await?;
    tracing::info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Catalog validated"
    );

    let pool = connect().await?;
    let category_repo = CategoryRepository::new(&pool);
    let product_repo = ProductRepository::new(&pool);

    let mut category_ids: HashMap<Slug, CategoryId> = HashMap::new();
    for (input, slug) in &catalog.categories {
        let id = category_repo.upsert(input, slug).await?;
        category_ids.insert(slug.clone(), id);
    }

    let mut products = 0;
    for (mut input, slug, category) in catalog.products {
        input.category_id = category.and_then(|c| category_ids.get(&c).copied());
        let id = product_repo.upsert(&input, &slug).await?;
        tracing::debug!(product_id = %id, slug = %slug, "Upserted product");
        products += 1;
    }

    let summary = SeedSummary {
        categories: category_ids.len(),
        products,
    };
    tracing::info!(
        categories = summary.categories,
        products = summary.products,
        "Catalog seeded"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../seed/catalog.yaml");

    fn parse(yaml: &str) -> Catalog {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_sample_catalog_is_valid() {
        let catalog = parse(SAMPLE).validate().unwrap();
        assert!(!catalog.categories.is_empty());
        assert!(!catalog.products.is_empty());
        assert!(catalog.products.iter().all(|(_, _, c)| c.is_some()));
    }

    #[test]
    fn test_defaults_applied() {
        let catalog = parse(
            r#"
products:
  - name: Plain Yoghurt
    price: "2.10"
"#,
        );
        let product = catalog.products.first().unwrap();
        assert_eq!(product.unit, ProductUnit::Each);
        assert_eq!(product.stock, 0);
        assert!(product.is_active);
        assert!(!product.is_featured);

        let validated = catalog.validate().unwrap();
        let (_, slug, category) = validated.products.first().unwrap();
        assert_eq!(slug.as_str(), "plain-yoghurt");
        assert!(category.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_yaml::from_str::<Catalog>(
            r#"
products:
  - name: Milk
    price: "1.00"
    colour: white
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_discount_rejected() {
        let result = serde_yaml::from_str::<Catalog>(
            r#"
products:
  - name: Milk
    price: "1.00"
    discount_percent: 95
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let catalog = parse(
            r#"
categories:
  - name: Dairy
  - name: Dairy
  - name: "  "
products:
  - name: Milk
    category: dairy
    price: "0"
  - name: Cheese
    category: bakery
    price: "4.50"
  - name: Butter
    category: dairy
    price: "3.20"
  - name: Butter
    price: "3.40"
"#,
        );
        let Err(CliError::InvalidSeed(errors)) = catalog.validate() else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("duplicate slug 'dairy'")));
        assert!(errors.iter().any(|e| e.contains("categories[2]")));
        assert!(errors.iter().any(|e| e.contains("price")));
        assert!(errors.iter().any(|e| e.contains("unknown category 'bakery'")));
        assert!(errors.iter().any(|e| e.contains("duplicate slug 'butter'")));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load(Path::new("/nonexistent/catalog.yaml")).await.unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
