//! Room allocation engine - turns a pending application into a room assignment.
//!
//! Allocation is first-fit: the free room with the lowest id in the requested hostel is taken.
//! Approving the application, claiming the room and decrementing the hostel's `available_rooms`
//! happen in one database transaction, and each statement is guarded by the state it expects
//! (application still pending, room still free, counter still positive). The guarded status
//! update runs first, so the transaction holds the write lock before it reads anything. When two
//! principals race for the last room, the second one only sees the store after the first has
//! committed and finds no free room.

use crate::{
    core::context::PrincipalContext,
    entities::{Application, ApplicationStatus, Hostel, Room, User, application, hostel, room},
    errors::Result,
};
use sea_orm::{
    DatabaseTransaction, DbErr, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{info, instrument, warn};

/// Result of [`approve_application`]. Only `Allocated` changes any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// A room was bound to the student and the application approved
    Allocated {
        /// Allocated room id
        room_id: i64,
        /// Allocated room label
        room_number: String,
        /// Student now holding the room
        student_id: i64,
        /// Hostel the room belongs to
        hostel_id: i64,
    },
    /// No application with that id exists within the principal's college
    ApplicationNotFound,
    /// The application was approved earlier
    AlreadyApproved,
    /// The hostel has no unallocated room; the application stays pending
    NoFreeRoom,
}

/// Approves an application by allocating the first free room of its hostel.
///
/// Missing applications, already approved applications and full hostels are no-ops reported
/// through [`AllocationOutcome`]; none of them is an error.
#[instrument(skip(db))]
pub async fn approve_application(
    db: &DatabaseConnection,
    principal: &PrincipalContext,
    application_id: i64,
) -> Result<AllocationOutcome> {
    let txn = db.begin().await?;
    let outcome = allocate_in_transaction(&txn, principal, application_id).await?;

    if matches!(outcome, AllocationOutcome::Allocated { .. }) {
        txn.commit().await?;
        info!(principal_id = principal.user_id, ?outcome, "Room allocated");
    } else {
        txn.rollback().await?;
        info!(principal_id = principal.user_id, ?outcome, "Application left unchanged");
    }
    Ok(outcome)
}

async fn allocate_in_transaction(
    txn: &DatabaseTransaction,
    principal: &PrincipalContext,
    application_id: i64,
) -> Result<AllocationOutcome> {
    // Write first; anything below that bails out is undone by the caller's rollback.
    let approved = Application::update_many()
        .col_expr(
            application::Column::Status,
            Expr::value(ApplicationStatus::Approved),
        )
        .filter(application::Column::Id.eq(application_id))
        .filter(application::Column::Status.eq(ApplicationStatus::Pending))
        .exec(txn)
        .await?;

    let Some(app) = Application::find_by_id(application_id).one(txn).await? else {
        return Ok(AllocationOutcome::ApplicationNotFound);
    };

    let student = User::find_by_id(app.student_id).one(txn).await?;
    let in_scope = student
        .and_then(|s| s.college)
        .is_some_and(|college| college == principal.college);
    if !in_scope {
        return Ok(AllocationOutcome::ApplicationNotFound);
    }

    if approved.rows_affected != 1 {
        return Ok(AllocationOutcome::AlreadyApproved);
    }

    let Some(claimed) = claim_first_free_room(txn, app.hostel_id, app.student_id).await? else {
        return Ok(AllocationOutcome::NoFreeRoom);
    };

    let counted = Hostel::update_many()
        .col_expr(
            hostel::Column::AvailableRooms,
            Expr::col(hostel::Column::AvailableRooms).sub(1),
        )
        .filter(hostel::Column::Id.eq(app.hostel_id))
        .filter(hostel::Column::AvailableRooms.gt(0))
        .exec(txn)
        .await?;
    if counted.rows_affected != 1 {
        warn!(
            hostel_id = app.hostel_id,
            "Free room found but available_rooms is already zero"
        );
        return Err(DbErr::Custom(format!(
            "available_rooms out of step with rooms for hostel {}",
            app.hostel_id
        ))
        .into());
    }

    Ok(AllocationOutcome::Allocated {
        room_id: claimed.id,
        room_number: claimed.room_number,
        student_id: app.student_id,
        hostel_id: app.hostel_id,
    })
}

/// Binds the lowest-id free room of `hostel_id` to `student_id`.
///
/// The update only matches while the room is still free; if another transaction got there
/// first the next candidate is tried.
async fn claim_first_free_room(
    txn: &DatabaseTransaction,
    hostel_id: i64,
    student_id: i64,
) -> Result<Option<room::Model>> {
    loop {
        let Some(candidate) = Room::find()
            .filter(room::Column::HostelId.eq(hostel_id))
            .filter(room::Column::IsAllocated.eq(false))
            .order_by_asc(room::Column::Id)
            .one(txn)
            .await?
        else {
            return Ok(None);
        };

        let claimed = Room::update_many()
            .col_expr(room::Column::IsAllocated, Expr::value(true))
            .col_expr(room::Column::StudentId, Expr::value(student_id))
            .filter(room::Column::Id.eq(candidate.id))
            .filter(room::Column::IsAllocated.eq(false))
            .exec(txn)
            .await?;

        if claimed.rows_affected == 1 {
            return Ok(Some(candidate));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::approval::submit_application;
    use crate::core::hostel::free_room_count;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    async fn assert_counter_consistent(db: &DatabaseConnection, hostel_id: i64) -> Result<i32> {
        let stored = Hostel::find_by_id(hostel_id).one(db).await?.unwrap();
        let free = free_room_count(db, hostel_id).await?;
        assert_eq!(u64::try_from(stored.available_rooms).unwrap(), free);
        Ok(stored.available_rooms)
    }

    #[tokio::test]
    async fn test_allocation_scenario() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let principal = principal_ctx(&db, "p", "X").await?;
        let warden = approved_warden(&db, "w", "X").await?;
        let alpha = create_test_hostel(&db, &warden, "Alpha", 2).await?;
        assert_eq!(alpha.available_rooms, 2);

        let s = approved_student(&db, "S", "X").await?;
        let t = approved_student(&db, "T", "X").await?;
        let u = approved_student(&db, "U", "X").await?;

        let app_s = submit_application(&db, &s, alpha.id).await?.unwrap();
        assert_eq!(app_s.status, ApplicationStatus::Pending);

        let outcome = approve_application(&db, &principal, app_s.id).await?;
        let AllocationOutcome::Allocated { room_number, student_id, .. } = outcome else {
            panic!("expected allocation, got {outcome:?}");
        };
        assert_eq!(room_number, "R1");
        assert_eq!(student_id, s.student_id);
        assert_eq!(assert_counter_consistent(&db, alpha.id).await?, 1);
        let reloaded = Application::find_by_id(app_s.id).one(&db).await?.unwrap();
        assert_eq!(reloaded.status, ApplicationStatus::Approved);

        let app_t = submit_application(&db, &t, alpha.id).await?.unwrap();
        let outcome = approve_application(&db, &principal, app_t.id).await?;
        assert!(matches!(
            outcome,
            AllocationOutcome::Allocated { ref room_number, .. } if room_number == "R2"
        ));
        assert_eq!(assert_counter_consistent(&db, alpha.id).await?, 0);

        let app_u = submit_application(&db, &u, alpha.id).await?.unwrap();
        let outcome = approve_application(&db, &principal, app_u.id).await?;
        assert_eq!(outcome, AllocationOutcome::NoFreeRoom);
        assert_eq!(assert_counter_consistent(&db, alpha.id).await?, 0);
        let still_pending = Application::find_by_id(app_u.id).one(&db).await?.unwrap();
        assert_eq!(still_pending.status, ApplicationStatus::Pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_rooms_bound_to_students() -> Result<()> {
        let db = setup_test_db().await?;
        let principal = principal_ctx(&db, "p", "X").await?;
        let warden = approved_warden(&db, "w", "X").await?;
        let alpha = create_test_hostel(&db, &warden, "Alpha", 3).await?;
        let s = approved_student(&db, "s", "X").await?;

        let app = submit_application(&db, &s, alpha.id).await?.unwrap();
        approve_application(&db, &principal, app.id).await?;

        let rooms = Room::find()
            .filter(room::Column::HostelId.eq(alpha.id))
            .order_by_asc(room::Column::Id)
            .all(&db)
            .await?;
        assert!(rooms[0].is_allocated);
        assert_eq!(rooms[0].student_id, Some(s.student_id));
        for other in &rooms[1..] {
            assert!(!other.is_allocated);
            assert!(other.student_id.is_none());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_approving_twice_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let principal = principal_ctx(&db, "p", "X").await?;
        let warden = approved_warden(&db, "w", "X").await?;
        let alpha = create_test_hostel(&db, &warden, "Alpha", 2).await?;
        let s = approved_student(&db, "s", "X").await?;

        let app = submit_application(&db, &s, alpha.id).await?.unwrap();
        approve_application(&db, &principal, app.id).await?;
        let second = approve_application(&db, &principal, app.id).await?;

        assert_eq!(second, AllocationOutcome::AlreadyApproved);
        assert_eq!(assert_counter_consistent(&db, alpha.id).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_application_is_noop() -> Result<()> {
        let db = setup_test_db().await?;
        let principal = principal_ctx(&db, "p", "X").await?;

        let outcome = approve_application(&db, &principal, 4242).await?;
        assert_eq!(outcome, AllocationOutcome::ApplicationNotFound);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_college_application_is_not_visible() -> Result<()> {
        let db = setup_test_db().await?;
        let principal_y = principal_ctx(&db, "py", "Y").await?;
        let warden = approved_warden(&db, "w", "X").await?;
        let alpha = create_test_hostel(&db, &warden, "Alpha", 1).await?;
        let s = approved_student(&db, "s", "X").await?;
        let app = submit_application(&db, &s, alpha.id).await?.unwrap();

        let outcome = approve_application(&db, &principal_y, app.id).await?;
        assert_eq!(outcome, AllocationOutcome::ApplicationNotFound);
        assert_eq!(assert_counter_consistent(&db, alpha.id).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_capacity_exhaustion_after_n_allocations() -> Result<()> {
        let db = setup_test_db().await?;
        let principal = principal_ctx(&db, "p", "X").await?;
        let warden = approved_warden(&db, "w", "X").await?;
        let beta = create_test_hostel(&db, &warden, "Beta", 3).await?;

        for i in 0..3 {
            let s = approved_student(&db, &format!("s{i}"), "X").await?;
            let app = submit_application(&db, &s, beta.id).await?.unwrap();
            let outcome = approve_application(&db, &principal, app.id).await?;
            assert!(matches!(outcome, AllocationOutcome::Allocated { .. }));
            assert_counter_consistent(&db, beta.id).await?;
        }

        let extra = approved_student(&db, "extra", "X").await?;
        let app = submit_application(&db, &extra, beta.id).await?.unwrap();
        let outcome = approve_application(&db, &principal, app.id).await?;
        assert_eq!(outcome, AllocationOutcome::NoFreeRoom);
        assert_eq!(assert_counter_consistent(&db, beta.id).await?, 0);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_approvals_for_last_room() -> Result<()> {
        const RACERS: usize = 4;

        for round in 0..5 {
            let db = setup_file_test_db().await?;
            let principal = principal_ctx(&db, "p", "X").await?;
            let warden = approved_warden(&db, "w", "X").await?;
            let alpha = create_test_hostel(&db, &warden, "Alpha", 1).await?;

            let mut applications = Vec::with_capacity(RACERS);
            for i in 0..RACERS {
                let s = approved_student(&db, &format!("s{i}"), "X").await?;
                applications.push(submit_application(&db, &s, alpha.id).await?.unwrap());
            }

            let handles: Vec<_> = applications
                .iter()
                .map(|app| {
                    let db = db.clone();
                    let principal = principal.clone();
                    let application_id = app.id;
                    tokio::spawn(async move {
                        approve_application(&db, &principal, application_id).await
                    })
                })
                .collect();

            let mut outcomes = Vec::with_capacity(RACERS);
            for handle in handles {
                outcomes.push(handle.await.unwrap()?);
            }

            let allocated = outcomes
                .iter()
                .filter(|o| matches!(o, AllocationOutcome::Allocated { .. }))
                .count();
            let refused = outcomes
                .iter()
                .filter(|o| **o == AllocationOutcome::NoFreeRoom)
                .count();
            assert_eq!(allocated, 1, "round {round}: {outcomes:?}");
            assert_eq!(refused, RACERS - 1, "round {round}: {outcomes:?}");
            assert_eq!(assert_counter_consistent(&db, alpha.id).await?, 0);

            let approved = Application::find()
                .filter(application::Column::Status.eq(ApplicationStatus::Approved))
                .count(&db)
                .await?;
            assert_eq!(approved, 1);
        }
        Ok(())
    }
}
