//! Student pages.

use super::{AppState, session::StudentUser};
use crate::{
    core::{
        approval::submit_application,
        hostel::{StudentDashboard, student_dashboard},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};

/// Hostels with capacity, their photos and the student's applications.
pub async fn dashboard(
    State(state): State<AppState>,
    StudentUser(student): StudentUser,
) -> Result<Json<StudentDashboard>> {
    Ok(Json(student_dashboard(&state.db, &student).await?))
}

/// Files an application for `hostel_id`.
pub async fn apply(
    State(state): State<AppState>,
    StudentUser(student): StudentUser,
    Path(hostel_id): Path<i64>,
) -> Result<Redirect> {
    submit_application(&state.db, &student, hostel_id).await?;
    Ok(Redirect::to("/student"))
}
