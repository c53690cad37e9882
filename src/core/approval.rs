//! Approval workflow - account approval and application intake.
//!
//! Every non-admin account sits behind an approval flag. The admin approves principals; a
//! principal approves or rejects students and wardens of their own college only. The college
//! scope is part of each statement's filter, so a cross-college id simply matches no row.

use crate::{
    core::context::{AdminContext, PrincipalContext, StudentContext},
    entities::{
        Application, ApplicationStatus, Hostel, User, UserRole, application, hostel, user,
    },
    errors::Result,
    storage::BlobStore,
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*, sea_query::Expr};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument};

/// An account waiting for approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUser {
    /// User id
    pub id: i64,
    /// Login name
    pub username: String,
    /// Requested role
    pub role: UserRole,
    /// College the account belongs to
    pub college: Option<String>,
    /// Stored id-card blob, for students
    pub id_card: Option<String>,
}

impl From<user::Model> for PendingUser {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
            college: model.college,
            id_card: model.id_card,
        }
    }
}

/// A pending application together with the names a reviewer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingApplication {
    /// Application id
    pub id: i64,
    /// Applying student
    pub student_id: i64,
    /// Student's username
    pub username: String,
    /// Requested hostel
    pub hostel_id: i64,
    /// Requested hostel's name
    pub hostel_name: String,
}

/// What a principal has to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingReview {
    /// Unapproved students and wardens of the college
    pub users: Vec<PendingUser>,
    /// Pending applications filed by students of the college
    pub applications: Vec<PendingApplication>,
}

/// Lists principals awaiting approval.
pub async fn list_pending_principals(
    db: &DatabaseConnection,
    _admin: &AdminContext,
) -> Result<Vec<PendingUser>> {
    let principals = User::find()
        .filter(user::Column::Role.eq(UserRole::Principal))
        .filter(user::Column::Approved.eq(false))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    Ok(principals.into_iter().map(PendingUser::from).collect())
}

/// Approves a principal account.
///
/// Returns `true` when the account moved from pending to approved; approving an already
/// approved principal, a missing id or a non-principal changes nothing and returns `false`.
#[instrument(skip(db))]
pub async fn approve_principal(
    db: &DatabaseConnection,
    admin: &AdminContext,
    user_id: i64,
) -> Result<bool> {
    let result = User::update_many()
        .col_expr(user::Column::Approved, Expr::value(true))
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::Role.eq(UserRole::Principal))
        .filter(user::Column::Approved.eq(false))
        .exec(db)
        .await?;

    let approved = result.rows_affected > 0;
    info!(admin_id = admin.user_id, approved, "Principal approval processed");
    Ok(approved)
}

/// Approves a student or warden of the principal's college.
///
/// Targets outside the college, of another role, already approved, or missing are left
/// untouched and yield `false`.
#[instrument(skip(db))]
pub async fn approve_user(
    db: &DatabaseConnection,
    principal: &PrincipalContext,
    user_id: i64,
) -> Result<bool> {
    let result = User::update_many()
        .col_expr(user::Column::Approved, Expr::value(true))
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::Role.is_in([UserRole::Student, UserRole::Warden]))
        .filter(user::Column::College.eq(principal.college.as_str()))
        .filter(user::Column::Approved.eq(false))
        .exec(db)
        .await?;

    let approved = result.rows_affected > 0;
    info!(principal_id = principal.user_id, approved, "User approval processed");
    Ok(approved)
}

/// Rejects a pending student or warden of the principal's college by deleting the account.
///
/// Approved accounts and accounts of other colleges are never deleted. The id card blob of a
/// deleted account is discarded as well.
#[instrument(skip(db, blobs))]
pub async fn reject_user(
    db: &DatabaseConnection,
    blobs: &BlobStore,
    principal: &PrincipalContext,
    user_id: i64,
) -> Result<bool> {
    let pending = || {
        Condition::all()
            .add(user::Column::Id.eq(user_id))
            .add(user::Column::Role.is_in([UserRole::Student, UserRole::Warden]))
            .add(user::Column::College.eq(principal.college.as_str()))
            .add(user::Column::Approved.eq(false))
    };

    let Some(target) = User::find().filter(pending()).one(db).await? else {
        info!(principal_id = principal.user_id, rejected = false, "User rejection processed");
        return Ok(false);
    };
    let result = User::delete_many().filter(pending()).exec(db).await?;

    let rejected = result.rows_affected > 0;
    if rejected {
        if let Some(id_card) = &target.id_card {
            blobs.discard(id_card).await;
        }
    }
    info!(principal_id = principal.user_id, rejected, "User rejection processed");
    Ok(rejected)
}

/// Pending accounts and pending applications of the principal's college.
pub async fn list_pending(
    db: &DatabaseConnection,
    principal: &PrincipalContext,
) -> Result<PendingReview> {
    let users = User::find()
        .filter(user::Column::Role.is_in([UserRole::Student, UserRole::Warden]))
        .filter(user::Column::Approved.eq(false))
        .filter(user::Column::College.eq(principal.college.as_str()))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(PendingUser::from)
        .collect();

    let rows = Application::find()
        .filter(application::Column::Status.eq(ApplicationStatus::Pending))
        .find_also_related(User)
        .filter(user::Column::College.eq(principal.college.as_str()))
        .order_by_asc(application::Column::Id)
        .all(db)
        .await?;

    let hostel_ids: Vec<i64> = rows.iter().map(|(app, _)| app.hostel_id).collect();
    let hostel_names: HashMap<i64, String> = Hostel::find()
        .filter(hostel::Column::Id.is_in(hostel_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|h| (h.id, h.name))
        .collect();

    let applications = rows
        .into_iter()
        .filter_map(|(app, student)| {
            let student = student?;
            Some(PendingApplication {
                id: app.id,
                student_id: app.student_id,
                username: student.username,
                hostel_id: app.hostel_id,
                hostel_name: hostel_names.get(&app.hostel_id).cloned().unwrap_or_default(),
            })
        })
        .collect();

    Ok(PendingReview {
        users,
        applications,
    })
}

/// Files a pending application for the calling student.
///
/// Capacity is not checked here and repeat applications to the same hostel are accepted; both
/// are settled when a principal approves. A hostel that does not exist in the student's college
/// yields `None` and nothing is written.
#[instrument(skip(db))]
pub async fn submit_application(
    db: &DatabaseConnection,
    student: &StudentContext,
    hostel_id: i64,
) -> Result<Option<application::Model>> {
    let target = Hostel::find_by_id(hostel_id)
        .filter(hostel::Column::College.eq(student.college.as_str()))
        .one(db)
        .await?;
    if target.is_none() {
        info!(student_id = student.student_id, "Ignored application to unknown hostel");
        return Ok(None);
    }

    let created = application::ActiveModel {
        student_id: Set(student.student_id),
        hostel_id: Set(hostel_id),
        status: Set(ApplicationStatus::Pending),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        application_id = created.id,
        student_id = student.student_id,
        "Application submitted"
    );
    Ok(Some(created))
}
