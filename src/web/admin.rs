//! Admin pages.

use super::{AppState, session::AdminUser};
use crate::{
    core::approval::{self, PendingUser},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};

/// Principals waiting for approval.
pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<PendingUser>>> {
    Ok(Json(approval::list_pending_principals(&state.db, &admin).await?))
}

/// Approves a principal and returns to the dashboard.
pub async fn approve(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Redirect> {
    approval::approve_principal(&state.db, &admin, user_id).await?;
    Ok(Redirect::to("/admin"))
}
