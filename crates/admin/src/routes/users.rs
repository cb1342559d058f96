//! Account administration.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use freshmart_core::{Page, PageRequest, UserId, UserRole};
use freshmart_db::UserRepository;
use freshmart_db::models::User;
use freshmart_db::users::UserFilter;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CurrentAdmin, UserDetail};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    /// Name or email.
    pub q: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl UserListQuery {
    fn filter(&self) -> UserFilter {
        UserFilter {
            q: self.q.clone(),
            role: self.role,
            is_active: self.is_active,
        }
    }

    fn page(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(PageRequest::DEFAULT_PER_PAGE),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct ActiveUpdate {
    pub is_active: bool,
}

/// Admins may not lock themselves out.
fn ensure_not_self(admin: &CurrentAdmin, target: UserId, action: &str) -> Result<()> {
    if admin.id == target {
        return Err(AppError::Conflict(format!("you cannot {action} your own account")));
    }
    Ok(())
}

/// GET /api/users
#[instrument(skip(state, _admin))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Page<User>>> {
    Ok(Json(
        UserRepository::new(state.pool())
            .list(&query.filter(), query.page())
            .await?,
    ))
}

/// GET /api/users/{id}
#[instrument(skip(state, _admin))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserDetail>> {
    let users = UserRepository::new(state.pool());
    let (user, stats) = tokio::try_join!(users.get_by_id(id), users.order_stats(id))?;
    let user = user.ok_or_else(|| AppError::NotFound("user".to_owned()))?;
    Ok(Json(UserDetail { user, stats }))
}

/// PATCH /api/users/{id}/role
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(update): Json<RoleUpdate>,
) -> Result<Json<User>> {
    if update.role != UserRole::Admin {
        ensure_not_self(&admin, id, "demote")?;
    }
    let user = UserRepository::new(state.pool())
        .set_role(id, update.role)
        .await?;
    tracing::info!(user_id = %id, role = %user.role, "Role changed");
    Ok(Json(user))
}

/// PATCH /api/users/{id}/active
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_active(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(update): Json<ActiveUpdate>,
) -> Result<Json<User>> {
    if !update.is_active {
        ensure_not_self(&admin, id, "deactivate")?;
    }
    let user = UserRepository::new(state.pool())
        .set_active(id, update.is_active)
        .await?;
    tracing::info!(user_id = %id, is_active = user.is_active, "Account status changed");
    Ok(Json(user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Uri;
    use freshmart_core::Email;

    fn admin(id: i32) -> CurrentAdmin {
        CurrentAdmin {
            id: UserId::new(id),
            email: Email::parse("ops@freshmart.test").unwrap(),
            name: "Ops".to_owned(),
        }
    }

    #[test]
    fn test_admins_cannot_act_on_themselves() {
        let err = ensure_not_self(&admin(7), UserId::new(7), "demote").unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict(msg) if msg == "you cannot demote your own account"
        ));
        assert!(ensure_not_self(&admin(7), UserId::new(8), "demote").is_ok());
    }

    #[test]
    fn test_user_filters() {
        let uri: Uri = "/api/users?role=admin&q=ann&is_active=false".parse().unwrap();
        let q = Query::<UserListQuery>::try_from_uri(&uri).unwrap().0;
        let filter = q.filter();
        assert_eq!(filter.role, Some(UserRole::Admin));
        assert_eq!(filter.q.as_deref(), Some("ann"));
        assert_eq!(filter.is_active, Some(false));
    }
}
