//! Principal pages: account review and hostel allocation.

use super::{AppState, session::PrincipalUser};
use crate::{
    core::{
        allocation::{AllocationOutcome, approve_application},
        approval::{self, PendingReview},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use tracing::debug;

/// Pending accounts and applications of the principal's college.
pub async fn dashboard(
    State(state): State<AppState>,
    PrincipalUser(principal): PrincipalUser,
) -> Result<Json<PendingReview>> {
    Ok(Json(approval::list_pending(&state.db, &principal).await?))
}

/// Approves a student or warden.
pub async fn approve_user(
    State(state): State<AppState>,
    PrincipalUser(principal): PrincipalUser,
    Path(user_id): Path<i64>,
) -> Result<Redirect> {
    approval::approve_user(&state.db, &principal, user_id).await?;
    Ok(Redirect::to("/principal"))
}

/// Rejects a pending student or warden.
pub async fn reject_user(
    State(state): State<AppState>,
    PrincipalUser(principal): PrincipalUser,
    Path(user_id): Path<i64>,
) -> Result<Redirect> {
    approval::reject_user(&state.db, &state.blobs, &principal, user_id).await?;
    Ok(Redirect::to("/principal"))
}

/// Runs the allocation for an application. Every outcome returns to the dashboard.
pub async fn approve_hostel(
    State(state): State<AppState>,
    PrincipalUser(principal): PrincipalUser,
    Path(application_id): Path<i64>,
) -> Result<Redirect> {
    let outcome = approve_application(&state.db, &principal, application_id).await?;
    if !matches!(outcome, AllocationOutcome::Allocated { .. }) {
        debug!(application_id, ?outcome, "Allocation had no effect");
    }
    Ok(Redirect::to("/principal"))
}
