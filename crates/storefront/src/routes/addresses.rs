//! Delivery address routes (signed-in shoppers only).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use freshmart_core::AddressId;
use freshmart_db::AddressRepository;
use freshmart_db::models::{Address, AddressInput};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

fn validated(input: AddressInput) -> Result<AddressInput> {
    let input = input.normalized();
    input.validate().map_err(AppError::BadRequest)?;
    Ok(input)
}

/// GET /api/addresses
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(AddressRepository::new(state.pool()).list(user.id).await?))
}

/// POST /api/addresses
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    let input = validated(input)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// PUT /api/addresses/{id}
#[instrument(skip(state, user, input))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>> {
    let input = validated(input)?;
    Ok(Json(
        AddressRepository::new(state.pool())
            .update(user.id, id, &input)
            .await?,
    ))
}

/// DELETE /api/addresses/{id}
#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/addresses/{id}/default
#[instrument(skip(state, user))]
pub async fn set_default(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    Ok(Json(
        AddressRepository::new(state.pool())
            .set_default(user.id, id)
            .await?,
    ))
}
