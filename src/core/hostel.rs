//! Hostel business logic - hostel creation and the student-facing views.

use crate::{
    core::context::{StudentContext, WardenContext},
    entities::{
        Application, ApplicationStatus, Hostel, Room, RoomPhoto, application, hostel, room,
        room_photo,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Upper bound for rooms created with a single hostel.
pub const MAX_ROOMS_PER_HOSTEL: i32 = 1000;

/// Creates a hostel run by the calling warden together with rooms `R1..Rn`.
///
/// The hostel row and all room rows are written in one transaction, starting with
/// `available_rooms == total_rooms`.
#[instrument(skip(db))]
pub async fn add_hostel(
    db: &DatabaseConnection,
    warden: &WardenContext,
    name: &str,
    total_rooms: i32,
) -> Result<hostel::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Hostel name cannot be empty"));
    }
    if !(1..=MAX_ROOMS_PER_HOSTEL).contains(&total_rooms) {
        return Err(Error::validation(format!(
            "Total rooms must be between 1 and {MAX_ROOMS_PER_HOSTEL}"
        )));
    }

    let txn = db.begin().await?;

    let created = hostel::ActiveModel {
        name: Set(name.to_string()),
        college: Set(warden.college.clone()),
        warden_id: Set(warden.warden_id),
        total_rooms: Set(total_rooms),
        available_rooms: Set(total_rooms),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let rooms = (1..=total_rooms).map(|n| room::ActiveModel {
        hostel_id: Set(created.id),
        room_number: Set(format!("R{n}")),
        is_allocated: Set(false),
        student_id: Set(None),
        ..Default::default()
    });
    Room::insert_many(rooms).exec(&txn).await?;

    txn.commit().await?;
    info!(hostel_id = created.id, total_rooms, "Hostel created");
    Ok(created)
}

/// Counts the unallocated rooms of a hostel straight from room state.
pub async fn free_room_count<C>(db: &C, hostel_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Room::find()
        .filter(room::Column::HostelId.eq(hostel_id))
        .filter(room::Column::IsAllocated.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Hostels of the student's college that still have capacity.
pub async fn list_available_hostels(
    db: &DatabaseConnection,
    student: &StudentContext,
) -> Result<Vec<hostel::Model>> {
    Hostel::find()
        .filter(hostel::Column::College.eq(student.college.as_str()))
        .filter(hostel::Column::AvailableRooms.gt(0))
        .order_by_asc(hostel::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A photo shown to students, with the hostel it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoView {
    /// Hostel shown
    pub hostel_id: i64,
    /// Blob name, served under `/uploads/`
    pub filename: String,
}

/// One of the student's own applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentApplicationView {
    /// Application id
    pub id: i64,
    /// Requested hostel
    pub hostel_id: i64,
    /// Current status
    pub status: ApplicationStatus,
    /// Room number held in that hostel, once allocated
    pub room_number: Option<String>,
}

/// Everything the student dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentDashboard {
    /// Hostels with capacity in the student's college
    pub hostels: Vec<hostel::Model>,
    /// Photos of hostels in the student's college
    pub photos: Vec<PhotoView>,
    /// The student's own applications, oldest first
    pub applications: Vec<StudentApplicationView>,
}

/// Builds the student dashboard.
pub async fn student_dashboard(
    db: &DatabaseConnection,
    student: &StudentContext,
) -> Result<StudentDashboard> {
    let hostels = list_available_hostels(db, student).await?;

    let photos = RoomPhoto::find()
        .inner_join(Hostel)
        .filter(hostel::Column::College.eq(student.college.as_str()))
        .order_by_asc(room_photo::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|p| PhotoView {
            hostel_id: p.hostel_id,
            filename: p.filename,
        })
        .collect();

    let held_rooms: HashMap<i64, String> = Room::find()
        .filter(room::Column::StudentId.eq(student.student_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.hostel_id, r.room_number))
        .collect();

    let applications = Application::find()
        .filter(application::Column::StudentId.eq(student.student_id))
        .order_by_asc(application::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|a| StudentApplicationView {
            id: a.id,
            hostel_id: a.hostel_id,
            status: a.status,
            room_number: (a.status == ApplicationStatus::Approved)
                .then(|| held_rooms.get(&a.hostel_id).cloned())
                .flatten(),
        })
        .collect();

    Ok(StudentDashboard {
        hostels,
        photos,
        applications,
    })
}
