//! Credential store - account creation, registration and password verification.
//!
//! Passwords are stored as salted Argon2id PHC strings and checked with the hasher's
//! constant-time verification. Plaintext passwords never reach the database.

use crate::{
    config::settings::BootstrapSettings,
    entities::{User, UserRole, user},
    errors::{Error, Result},
    storage::{BlobStore, Upload},
};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use sea_orm::{Set, SqlErr, prelude::*};
use std::sync::OnceLock;
use tracing::{info, instrument, warn};

/// Input for [`create_user`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Login name
    pub username: String,
    /// Plaintext password; hashed before storage
    pub password: String,
    /// Account role
    pub role: UserRole,
    /// College; required for every role but admin
    pub college: Option<String>,
    /// Stored id-card blob name (students)
    pub id_card: Option<String>,
}

/// A self-registration as submitted through `/register/{role}`.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Requested role; admin is refused
    pub role: UserRole,
    /// Login name
    pub username: String,
    /// Plaintext password
    pub password: String,
    /// College the account belongs to
    pub college: Option<String>,
    /// Id card upload; mandatory for students
    pub id_card: Option<Upload>,
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks `password` against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    #[cfg(test)]
    tests::HASHER_CALLS.with(|calls| calls.set(calls.get() + 1));
    let parsed = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Finds a user by username.
pub async fn find_by_username<C>(db: &C, username: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an account. Usernames are trimmed and must be unique.
#[instrument(skip(db, account), fields(username = %account.username, role = ?account.role))]
pub async fn create_user<C>(db: &C, account: NewAccount, approved: bool) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let username = account.username.trim().to_string();
    if username.is_empty() {
        return Err(Error::validation("Username cannot be empty"));
    }
    if account.password.is_empty() {
        return Err(Error::validation("Password cannot be empty"));
    }
    if find_by_username(db, &username).await?.is_some() {
        return Err(Error::UsernameTaken { username });
    }

    let model = user::ActiveModel {
        username: Set(username.clone()),
        password_hash: Set(hash_password(&account.password)?),
        role: Set(account.role),
        college: Set(account.college),
        approved: Set(approved),
        id_card: Set(account.id_card),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = model
        .insert(db)
        .await
        .map_err(|e| unique_violation_as_taken(e, &username))?;
    info!(user_id = created.id, approved, "Created account");
    Ok(created)
}

/// A concurrent registration can pass the lookup and still lose on the unique index.
fn unique_violation_as_taken(err: DbErr, username: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::UsernameTaken {
            username: username.to_string(),
        },
        _ => err.into(),
    }
}

/// Registers a new, unapproved account.
///
/// Students must include a non-empty id card. The blob is written before the row is
/// committed; if the insert fails the blob is discarded again.
#[instrument(skip(db, blobs, registration), fields(username = %registration.username, role = ?registration.role))]
pub async fn register(
    db: &DatabaseConnection,
    blobs: &BlobStore,
    registration: Registration,
) -> Result<user::Model> {
    if registration.role == UserRole::Admin {
        return Err(Error::validation("Admin accounts cannot be registered"));
    }
    let college = registration
        .college
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::validation("College is required"))?;
    if registration.username.trim().is_empty() || registration.password.is_empty() {
        return Err(Error::validation("Username and password are required"));
    }

    let id_card_upload = match (registration.role, registration.id_card) {
        (UserRole::Student, Some(upload)) if !upload.is_empty() => Some(upload),
        (UserRole::Student, _) => {
            return Err(Error::validation("Students must upload an id card"));
        }
        (_, _) => None,
    };

    if find_by_username(db, registration.username.trim())
        .await?
        .is_some()
    {
        return Err(Error::UsernameTaken {
            username: registration.username.trim().to_string(),
        });
    }

    let id_card = match &id_card_upload {
        Some(upload) => Some(blobs.save(upload).await?),
        None => None,
    };

    let account = NewAccount {
        username: registration.username,
        password: registration.password,
        role: registration.role,
        college: Some(college),
        id_card: id_card.clone(),
    };

    match create_user(db, account, false).await {
        Ok(created) => Ok(created),
        Err(e) => {
            if let Some(name) = id_card {
                blobs.discard(&name).await;
            }
            Err(e)
        }
    }
}

/// Hash checked when the username is unknown, so both outcomes cost one Argon2 verification.
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hash_password("decoy password").ok())
        .as_deref()
}

/// Returns the user when `username`/`password` match, `None` otherwise.
pub async fn verify<C>(db: &C, username: &str, password: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    let Some(found) = find_by_username(db, username.trim()).await? else {
        if let Some(decoy) = decoy_hash() {
            let _ = verify_password(password, decoy)?;
        }
        return Ok(None);
    };
    if verify_password(password, &found.password_hash)? {
        Ok(Some(found))
    } else {
        Ok(None)
    }
}

/// Verifies credentials and refuses accounts that are not yet approved.
#[instrument(skip(db, password))]
pub async fn authenticate<C>(db: &C, username: &str, password: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let Some(found) = verify(db, username, password).await? else {
        info!("Rejected sign-in with invalid credentials");
        return Err(Error::InvalidCredentials);
    };
    if !found.approved {
        info!(user_id = found.id, "Rejected sign-in for unapproved account");
        return Err(Error::ApprovalPending);
    }
    Ok(found)
}

/// Seeds the approved admin account when no admin exists yet.
///
/// Returns the created admin, or `None` when one was already present.
#[instrument(skip(db, bootstrap))]
pub async fn seed_admin(
    db: &DatabaseConnection,
    bootstrap: &BootstrapSettings,
) -> Result<Option<user::Model>> {
    let existing = User::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(None);
    }

    if bootstrap.uses_default_password() {
        warn!(
            "Seeding admin '{}' with the built-in default password; set HOSTEL_ADMIN_PASSWORD before exposing this service",
            bootstrap.admin_username
        );
    }

    let admin = create_user(
        db,
        NewAccount {
            username: bootstrap.admin_username.clone(),
            password: bootstrap.admin_password.clone(),
            role: UserRole::Admin,
            college: None,
            id_card: None,
        },
        true,
    )
    .await?;
    Ok(Some(admin))
}
