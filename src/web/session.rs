//! Session cookie handling and the role-gate extractors.
//!
//! Any failure to produce the required role context (no cookie, unknown token, wrong role)
//! rejects with a redirect to `/login`. Only a store failure turns into an error response.

use super::AppState;
use crate::core::{
    context::{AdminContext, PrincipalContext, SessionContext, StudentContext, WardenContext},
    sessions::resolve_session,
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use cookie::{Cookie, SameSite};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "hostel_session";

/// Extracts the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(std::result::Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Cookie handed out after a successful login.
#[must_use]
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie that makes the browser forget the session.
#[must_use]
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}

fn to_login() -> Response {
    Redirect::to("/login").into_response()
}

/// The signed-in caller, whatever the role.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// Raw session token
    pub token: String,
    /// Resolved caller context
    pub context: SessionContext,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Err(to_login());
        };
        match resolve_session(&state.db, &token).await {
            Ok(Some(context)) => Ok(Self { token, context }),
            Ok(None) => Err(to_login()),
            Err(e) => Err(e.into_response()),
        }
    }
}

macro_rules! role_extractor {
    ($(#[$doc:meta])* $name:ident, $context:ty, $gate:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(pub $context);

        #[axum::async_trait]
        impl FromRequestParts<AppState> for $name {
            type Rejection = Response;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> std::result::Result<Self, Self::Rejection> {
                let session = CurrentSession::from_request_parts(parts, state).await?;
                session.context.$gate().map(Self).ok_or_else(to_login)
            }
        }
    };
}

role_extractor!(
    /// Caller gated to the admin role.
    AdminUser,
    AdminContext,
    as_admin
);
role_extractor!(
    /// Caller gated to the principal role.
    PrincipalUser,
    PrincipalContext,
    as_principal
);
role_extractor!(
    /// Caller gated to the warden role.
    WardenUser,
    WardenContext,
    as_warden
);
role_extractor!(
    /// Caller gated to the student role.
    StudentUser,
    StudentContext,
    as_student
);
