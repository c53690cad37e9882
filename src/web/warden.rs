//! Warden pages: hostels, attendance and photos.

use super::{AppState, forms::MultipartForm, session::WardenUser};
use crate::{
    core::{
        hostel::add_hostel,
        warden::{self, AttendanceEntry, WardenDashboard},
    },
    errors::{Error, Result},
};
use axum::{
    Form, Json,
    extract::{Multipart, State},
    response::Redirect,
};
use chrono::NaiveDate;
use serde::Deserialize;

/// Everything the warden manages.
pub async fn dashboard(
    State(state): State<AppState>,
    WardenUser(warden): WardenUser,
) -> Result<Json<WardenDashboard>> {
    Ok(Json(warden::warden_dashboard(&state.db, &warden).await?))
}

/// Submitted hostel form.
#[derive(Debug, Deserialize)]
pub struct HostelForm {
    hostel_name: String,
    total_rooms: i32,
}

/// Creates a hostel with its rooms.
pub async fn create_hostel(
    State(state): State<AppState>,
    WardenUser(warden): WardenUser,
    Form(form): Form<HostelForm>,
) -> Result<Redirect> {
    add_hostel(&state.db, &warden, &form.hostel_name, form.total_rooms).await?;
    Ok(Redirect::to("/warden"))
}

/// Submitted attendance form.
#[derive(Debug, Deserialize)]
pub struct AttendanceForm {
    student_id: i64,
    date: String,
    status: String,
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| Error::validation("Date must be formatted as YYYY-MM-DD"))
}

/// Appends an attendance record.
pub async fn attendance(
    State(state): State<AppState>,
    WardenUser(warden): WardenUser,
    Form(form): Form<AttendanceForm>,
) -> Result<Redirect> {
    let entry = AttendanceEntry {
        student_id: form.student_id,
        date: parse_date(&form.date)?,
        status: form.status,
    };
    warden::record_attendance(&state.db, &warden, entry).await?;
    Ok(Redirect::to("/warden"))
}

/// Stores a hostel photo from a multipart form with `hostel_id` and `photo`.
pub async fn photo(
    State(state): State<AppState>,
    WardenUser(warden): WardenUser,
    multipart: Multipart,
) -> Result<Redirect> {
    let mut form = MultipartForm::read(multipart).await?;
    let hostel_id = form
        .text("hostel_id")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| Error::validation("A valid hostel id is required"))?;
    let upload = form
        .take_file("photo")
        .ok_or_else(|| Error::validation("A photo file is required"))?;
    warden::upload_photo(&state.db, &state.blobs, &warden, hostel_id, &upload).await?;
    Ok(Redirect::to("/warden"))
}
