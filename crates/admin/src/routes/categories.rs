//! Category management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use freshmart_core::{CategoryId, Slug};
use freshmart_db::CategoryRepository;
use freshmart_db::categories::resolve_slug;
use freshmart_db::models::{Category, CategoryInput};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Longest category name accepted.
const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// Check the input and settle its slug.
fn validated(input: &CategoryInput) -> Result<Slug> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_owned()));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name must be at most {MAX_CATEGORY_NAME_LENGTH} characters"
        )));
    }
    resolve_slug(input.slug.as_deref(), name).map_err(AppError::BadRequest)
}

/// GET /api/categories
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

/// POST /api/categories
#[instrument(skip_all, fields(admin_id = %admin.id, name = %input.name))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let slug = validated(&input)?;
    let category = CategoryRepository::new(state.pool())
        .create(&input, &slug)
        .await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categories/{id}
#[instrument(skip(state, _admin))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("category".to_owned()))
}

/// PUT /api/categories/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    let slug = validated(&input)?;
    Ok(Json(
        CategoryRepository::new(state.pool())
            .update(id, &input, &slug)
            .await?,
    ))
}

/// DELETE /api/categories/{id}
///
/// Products in the category are kept and become uncategorised.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
