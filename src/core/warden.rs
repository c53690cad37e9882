//! Warden operations - attendance, room photos and the warden dashboard.

use crate::{
    core::context::WardenContext,
    entities::{
        Attendance, Hostel, Room, RoomPhoto, User, UserRole, attendance, hostel, room, room_photo,
        user,
    },
    errors::{Error, Result},
    storage::{BlobStore, Upload},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// An attendance mark as submitted by a warden.
#[derive(Debug, Clone)]
pub struct AttendanceEntry {
    /// Student being marked
    pub student_id: i64,
    /// Day the mark refers to
    pub date: NaiveDate,
    /// Free-form status, e.g. "present"
    pub status: String,
}

/// Appends an attendance record.
///
/// The subject must be an approved student of the warden's college.
#[instrument(skip(db))]
pub async fn record_attendance(
    db: &DatabaseConnection,
    warden: &WardenContext,
    entry: AttendanceEntry,
) -> Result<attendance::Model> {
    let status = entry.status.trim();
    if status.is_empty() {
        return Err(Error::validation("Attendance status cannot be empty"));
    }

    let subject = User::find_by_id(entry.student_id)
        .filter(user::Column::Role.eq(UserRole::Student))
        .filter(user::Column::Approved.eq(true))
        .filter(user::Column::College.eq(warden.college.as_str()))
        .one(db)
        .await?;
    if subject.is_none() {
        return Err(Error::validation("Unknown student"));
    }

    let created = attendance::ActiveModel {
        student_id: Set(entry.student_id),
        warden_id: Set(warden.warden_id),
        date: Set(entry.date),
        status: Set(status.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(attendance_id = created.id, "Attendance recorded");
    Ok(created)
}

/// Stores a photo of one of the warden's hostels.
///
/// The blob is written first and the record committed afterwards; a failed insert discards the
/// blob again.
#[instrument(skip(db, blobs, photo), fields(filename = %photo.filename))]
pub async fn upload_photo(
    db: &DatabaseConnection,
    blobs: &BlobStore,
    warden: &WardenContext,
    hostel_id: i64,
    photo: &Upload,
) -> Result<room_photo::Model> {
    if photo.is_empty() {
        return Err(Error::validation("A photo file is required"));
    }

    let owned = Hostel::find_by_id(hostel_id)
        .filter(hostel::Column::WardenId.eq(warden.warden_id))
        .one(db)
        .await?;
    if owned.is_none() {
        return Err(Error::validation("Unknown hostel"));
    }

    let filename = blobs.save(photo).await?;
    let inserted = room_photo::ActiveModel {
        hostel_id: Set(hostel_id),
        warden_id: Set(warden.warden_id),
        filename: Set(filename.clone()),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(created) => {
            info!(photo_id = created.id, "Room photo stored");
            Ok(created)
        }
        Err(e) => {
            blobs.discard(&filename).await;
            Err(e.into())
        }
    }
}

/// Approved student of the warden's college.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    /// Student id
    pub id: i64,
    /// Student username
    pub username: String,
}

/// An attendance record with the student's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceView {
    /// Student username
    pub username: String,
    /// Day of the mark
    pub date: NaiveDate,
    /// Recorded status
    pub status: String,
}

/// A room of one of the warden's hostels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomView {
    /// Room label
    pub room_number: String,
    /// Hostel name
    pub hostel_name: String,
    /// Whether a student holds the room
    pub is_allocated: bool,
}

/// Everything the warden dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WardenDashboard {
    /// Approved students of the college
    pub students: Vec<StudentSummary>,
    /// Attendance recorded by this warden, newest date first
    pub attendance: Vec<AttendanceView>,
    /// Hostels run by this warden
    pub hostels: Vec<hostel::Model>,
    /// Rooms of those hostels
    pub rooms: Vec<RoomView>,
    /// Photos uploaded by this warden
    pub photos: Vec<room_photo::Model>,
}

/// Builds the warden dashboard.
pub async fn warden_dashboard(
    db: &DatabaseConnection,
    warden: &WardenContext,
) -> Result<WardenDashboard> {
    let students = User::find()
        .filter(user::Column::Role.eq(UserRole::Student))
        .filter(user::Column::Approved.eq(true))
        .filter(user::Column::College.eq(warden.college.as_str()))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|u| StudentSummary {
            id: u.id,
            username: u.username,
        })
        .collect();

    let attendance = Attendance::find()
        .filter(attendance::Column::WardenId.eq(warden.warden_id))
        .find_also_related(User)
        .order_by_desc(attendance::Column::Date)
        .order_by_desc(attendance::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|(mark, student)| AttendanceView {
            username: student.map(|s| s.username).unwrap_or_default(),
            date: mark.date,
            status: mark.status,
        })
        .collect();

    let hostels = Hostel::find()
        .filter(hostel::Column::WardenId.eq(warden.warden_id))
        .order_by_asc(hostel::Column::Id)
        .all(db)
        .await?;

    let rooms = Room::find()
        .find_also_related(Hostel)
        .filter(hostel::Column::WardenId.eq(warden.warden_id))
        .order_by_asc(room::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|(r, h)| RoomView {
            room_number: r.room_number,
            hostel_name: h.map(|h| h.name).unwrap_or_default(),
            is_allocated: r.is_allocated,
        })
        .collect();

    let photos = RoomPhoto::find()
        .filter(room_photo::Column::WardenId.eq(warden.warden_id))
        .order_by_asc(room_photo::Column::Id)
        .all(db)
        .await?;

    Ok(WardenDashboard {
        students,
        attendance,
        hostels,
        rooms,
        photos,
    })
}
