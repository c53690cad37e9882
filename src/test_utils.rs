//! Shared test utilities for the hostel service.
//!
//! This module provides helpers for setting up in-memory databases and for creating approved
//! accounts and hostels with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        context::{AdminContext, PrincipalContext, StudentContext, WardenContext},
        credentials::{find_by_username, hash_password},
        hostel::add_hostel,
    },
    entities::{User, UserRole, hostel, user},
    errors::{Error, Result},
    storage::{BlobStore, random_hex},
};
use sea_orm::{DatabaseConnection, Set, prelude::*};
use std::sync::OnceLock;

/// Password shared by every account created through [`create_test_user`].
pub const TEST_PASSWORD: &str = "correct horse";

/// Installs a test-friendly tracing subscriber. Safe to call from several tests.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database in the temp dir.
///
/// Unlike `sqlite::memory:`, this is served by a pool of several connections, so transactions
/// from concurrent tasks really overlap.
pub async fn setup_file_test_db() -> Result<DatabaseConnection> {
    let path = std::env::temp_dir().join(format!("hostel-test-{}.sqlite", random_hex(8)));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = sea_orm::Database::connect(url).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A blob store in a fresh directory under the system temp dir.
pub fn test_blob_store() -> BlobStore {
    BlobStore::new(std::env::temp_dir().join(format!("hostel-test-{}", random_hex(8))))
}

/// Argon2 is slow in debug builds; hash the shared password once per test binary.
fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).unwrap())
        .clone()
}

/// Creates an account whose password is [`TEST_PASSWORD`].
///
/// Duplicate usernames are refused the same way registration refuses them.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    role: UserRole,
    college: Option<&str>,
    approved: bool,
) -> Result<user::Model> {
    if find_by_username(db, username).await?.is_some() {
        return Err(Error::UsernameTaken {
            username: username.to_string(),
        });
    }
    let created = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(test_password_hash()),
        role: Set(role),
        college: Set(college.map(str::to_string)),
        approved: Set(approved),
        id_card: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(created)
}

/// Creates the admin and returns its context.
pub async fn admin_ctx(db: &DatabaseConnection) -> Result<AdminContext> {
    let admin = create_test_user(db, "admin", UserRole::Admin, None, true).await?;
    Ok(AdminContext { user_id: admin.id })
}

/// Creates an approved principal of `college`.
pub async fn principal_ctx(
    db: &DatabaseConnection,
    username: &str,
    college: &str,
) -> Result<PrincipalContext> {
    let principal =
        create_test_user(db, username, UserRole::Principal, Some(college), true).await?;
    Ok(PrincipalContext {
        user_id: principal.id,
        college: college.to_string(),
    })
}

/// Creates an approved warden of `college`.
pub async fn approved_warden(
    db: &DatabaseConnection,
    username: &str,
    college: &str,
) -> Result<WardenContext> {
    let warden = create_test_user(db, username, UserRole::Warden, Some(college), true).await?;
    Ok(WardenContext {
        warden_id: warden.id,
        college: college.to_string(),
    })
}

/// Creates an approved student of `college`.
pub async fn approved_student(
    db: &DatabaseConnection,
    username: &str,
    college: &str,
) -> Result<StudentContext> {
    let student = create_test_user(db, username, UserRole::Student, Some(college), true).await?;
    Ok(StudentContext {
        student_id: student.id,
        college: college.to_string(),
    })
}

/// Creates a hostel with `rooms` free rooms run by `warden`.
pub async fn create_test_hostel(
    db: &DatabaseConnection,
    warden: &WardenContext,
    name: &str,
    rooms: i32,
) -> Result<hostel::Model> {
    add_hostel(db, warden, name, rooms).await
}

/// Re-reads a user row.
pub async fn reload_user(db: &DatabaseConnection, id: i64) -> Result<Option<user::Model>> {
    Ok(User::find_by_id(id).one(db).await?)
}
