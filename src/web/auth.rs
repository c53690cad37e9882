//! Login, logout and self-registration.

use super::{
    AppState,
    forms::MultipartForm,
    session::{removal_cookie, session_cookie, session_token},
};
use crate::{
    core::{
        credentials::{self, Registration},
        sessions::{close_session, open_session},
    },
    entities::UserRole,
    errors::{Error, Result},
};
use axum::{
    Form, Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Submitted login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

/// Describes the login form.
pub async fn login_page() -> Json<Value> {
    Json(json!({
        "page": "login",
        "fields": ["username", "password"],
    }))
}

/// Verifies credentials, opens a session and sends the caller to their dashboard.
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response> {
    let user = credentials::authenticate(&state.db, &form.username, &form.password).await?;
    let token = open_session(&state.db, &user).await?;
    let destination = format!("/{}", user.role.as_str());
    info!(user_id = user.id, %destination, "Signed in");
    Ok((
        [(header::SET_COOKIE, session_cookie(token).to_string())],
        Redirect::to(&destination),
    )
        .into_response())
}

/// Ends the current session, if any.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    if let Some(token) = session_token(&headers) {
        close_session(&state.db, &token).await?;
    }
    Ok((
        [(header::SET_COOKIE, removal_cookie().to_string())],
        Redirect::to("/login"),
    )
        .into_response())
}

fn registrable_role(role: &str) -> Result<UserRole> {
    match UserRole::parse(role) {
        Some(role @ (UserRole::Principal | UserRole::Warden | UserRole::Student)) => Ok(role),
        Some(UserRole::Admin) | None => Err(Error::validation(format!("Cannot register as '{role}'"))),
    }
}

/// Describes the registration form for `role`.
pub async fn register_page(Path(role): Path<String>) -> Result<Json<Value>> {
    let role = registrable_role(&role)?;
    let mut fields = vec!["username", "password", "college"];
    if role == UserRole::Student {
        fields.push("id_card");
    }
    Ok(Json(json!({
        "page": "register",
        "role": role,
        "fields": fields,
    })))
}

/// Creates an unapproved account from a multipart form.
pub async fn register(
    State(state): State<AppState>,
    Path(role): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let role = registrable_role(&role)?;
    let mut form = MultipartForm::read(multipart).await?;
    let registration = Registration {
        role,
        username: form.text("username").unwrap_or_default().to_string(),
        password: form.text("password").unwrap_or_default().to_string(),
        college: form.text("college").map(str::to_string),
        id_card: form.take_file("id_card"),
    };
    credentials::register(&state.db, &state.blobs, registration).await?;
    Ok(Redirect::to("/login").into_response())
}
