//! Wishlist routes (signed-in shoppers only).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use freshmart_core::ProductId;
use freshmart_db::{ProductRepository, WishlistRepository};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, ProductSummary};
use crate::services::cart::{CartService, CartView};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WishlistStatus {
    pub product_id: ProductId,
    pub in_wishlist: bool,
}

async fn list(state: &AppState, user: &CurrentUser) -> Result<Json<Vec<ProductSummary>>> {
    let products = WishlistRepository::new(state.pool())
        .products(user.id)
        .await?;
    let pricing = state.pricing();
    Ok(Json(
        products
            .iter()
            .map(|p| ProductSummary::new(p, pricing))
            .collect(),
    ))
}

async fn ensure_product_exists(state: &AppState, product_id: ProductId) -> Result<()> {
    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;
    Ok(())
}

/// GET /api/wishlist
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ProductSummary>>> {
    list(&state, &user).await
}

/// GET /api/wishlist/ids
#[instrument(skip_all)]
pub async fn ids(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ProductId>>> {
    Ok(Json(
        WishlistRepository::new(state.pool())
            .product_ids(user.id)
            .await?,
    ))
}

/// GET /api/wishlist/{product_id}
#[instrument(skip(state, user))]
pub async fn status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistStatus>> {
    let in_wishlist = WishlistRepository::new(state.pool())
        .contains(user.id, product_id)
        .await?;
    Ok(Json(WishlistStatus {
        product_id,
        in_wishlist,
    }))
}

/// POST /api/wishlist/{product_id}
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ProductSummary>>> {
    ensure_product_exists(&state, product_id).await?;
    WishlistRepository::new(state.pool())
        .add(user.id, product_id)
        .await?;
    list(&state, &user).await
}

/// DELETE /api/wishlist/{product_id}
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ProductSummary>>> {
    WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    list(&state, &user).await
}

/// POST /api/wishlist/{product_id}/toggle
#[instrument(skip(state, user))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistStatus>> {
    let repo = WishlistRepository::new(state.pool());
    let in_wishlist = if repo.remove(user.id, product_id).await? {
        false
    } else {
        ensure_product_exists(&state, product_id).await?;
        repo.add(user.id, product_id).await?;
        true
    };

    Ok(Json(WishlistStatus {
        product_id,
        in_wishlist,
    }))
}

/// POST /api/wishlist/{product_id}/move-to-cart
///
/// The item leaves the wishlist only once it is in the cart.
#[instrument(skip(state, session, user))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let view = CartService::new(state.pool(), state.pricing(), &session, Some(user.id))
        .add(product_id, 1)
        .await?;
    WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;

    add_breadcrumb(
        "wishlist",
        "Moved to cart",
        &[("product_id", product_id.to_string())],
    );
    Ok(Json(view))
}
