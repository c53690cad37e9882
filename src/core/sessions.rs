//! Server-side sessions.
//!
//! Signing in stores a snapshot of the user's identity under a random token; the token is the
//! only thing handed to the client. Sessions expire [`SESSION_MAX_AGE_HOURS`] after sign-in.

use crate::{
    core::context::SessionContext,
    entities::{Session, session, user},
    errors::Result,
    storage::random_hex,
};
use sea_orm::{Set, prelude::*};
use tracing::{debug, info, instrument};

/// Lifetime of a session, counted from sign-in.
pub const SESSION_MAX_AGE_HOURS: i64 = 12;

fn expiry_cutoff() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now() - chrono::Duration::hours(SESSION_MAX_AGE_HOURS)
}

/// Deletes every expired session and returns how many were removed.
pub async fn prune_expired_sessions(db: &DatabaseConnection) -> Result<u64> {
    let result = Session::delete_many()
        .filter(session::Column::CreatedAt.lt(expiry_cutoff()))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        debug!(pruned = result.rows_affected, "Pruned expired sessions");
    }
    Ok(result.rows_affected)
}

/// Opens a session for an authenticated user and returns its token.
#[instrument(skip(db, user), fields(user_id = user.id))]
pub async fn open_session(db: &DatabaseConnection, user: &user::Model) -> Result<String> {
    prune_expired_sessions(db).await?;
    let token = random_hex(32);
    session::ActiveModel {
        token: Set(token.clone()),
        user_id: Set(user.id),
        username: Set(user.username.clone()),
        role: Set(user.role),
        college: Set(user.college.clone()),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;
    info!(role = ?user.role, "Opened session");
    Ok(token)
}

/// Resolves a token to the caller's context. Unknown and expired tokens yield `None`; an
/// expired session is deleted on the way.
pub async fn resolve_session(db: &DatabaseConnection, token: &str) -> Result<Option<SessionContext>> {
    let Some(found) = Session::find_by_id(token.to_string()).one(db).await? else {
        return Ok(None);
    };
    if found.created_at < expiry_cutoff() {
        close_session(db, token).await?;
        return Ok(None);
    }
    Ok(SessionContext::from_session(found))
}

/// Deletes the session behind `token`. Closing an unknown token is a no-op.
pub async fn close_session(db: &DatabaseConnection, token: &str) -> Result<()> {
    let result = Session::delete_by_id(token.to_string()).exec(db).await?;
    debug!(closed = result.rows_affected, "Closed session");
    Ok(())
}
