//! HTTP surface - axum router, role-gated handlers and error responses.
//!
//! Page rendering is left to clients: read endpoints answer with JSON, actions answer with a
//! `303 See Other` back to the caller's dashboard.

mod admin;
mod auth;
pub mod error;
mod forms;
mod principal;
pub mod session;
mod student;
mod uploads;
mod warden;

use crate::{errors::Result, storage::BlobStore};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Largest accepted request body; id cards and photos travel in multipart forms.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Relational store
    pub db: DatabaseConnection,
    /// Upload storage
    pub blobs: Arc<BlobStore>,
}

impl AppState {
    /// Bundles the store and blob storage.
    pub fn new(db: DatabaseConnection, blobs: BlobStore) -> Self {
        Self {
            db,
            blobs: Arc::new(blobs),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route(
            "/register/:role",
            get(auth::register_page).post(auth::register),
        )
        .route("/admin", get(admin::dashboard))
        .route("/admin/approve/:id", get(admin::approve))
        .route("/principal", get(principal::dashboard))
        .route("/principal/approve_user/:id", get(principal::approve_user))
        .route("/principal/reject_user/:id", get(principal::reject_user))
        .route(
            "/principal/approve_hostel/:id",
            get(principal::approve_hostel),
        )
        .route("/student", get(student::dashboard))
        .route("/student/apply/:hostel_id", get(student::apply))
        .route("/warden", get(warden::dashboard))
        .route("/warden/add_hostel", post(warden::create_hostel))
        .route("/warden/attendance", post(warden::attendance))
        .route("/warden/photo", post(warden::photo))
        .route("/uploads/:filename", get(uploads::serve_upload))
        .route("/health", get(healthcheck))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serves the router on `listener` until the process is stopped.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Hostel allocation service listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::hostel::free_room_count,
        entities::{Application, ApplicationStatus, UserRole},
        test_utils::*,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use sea_orm::EntityTrait;
    use tower::ServiceExt;

    async fn test_state() -> Result<AppState> {
        Ok(AppState::new(setup_test_db().await?, test_blob_store()))
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        router(state.clone()).oneshot(request).await.unwrap()
    }

    fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::COOKIE, format!("{}={token}", session::SESSION_COOKIE))
            .body(Body::empty())
            .unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(state: &AppState, username: &str) -> Response {
        login_with(state, username, "correct+horse").await
    }

    async fn login_with(state: &AppState, username: &str, password: &str) -> Response {
        let body = format!("username={username}&password={password}");
        send(
            state,
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    fn token_from(response: &Response) -> String {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = cookie::Cookie::parse(set_cookie.to_string()).unwrap();
        cookie.value().to_string()
    }

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let state = test_state().await?;
        let response = send(&state, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
        Ok(())
    }

    #[tokio::test]
    async fn test_role_pages_redirect_anonymous_callers() -> Result<()> {
        let state = test_state().await?;
        for uri in ["/admin", "/principal", "/student", "/warden", "/admin/approve/1"] {
            let response = send(&state, Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/login");
        }

        let response = send(&state, get_with_cookie("/admin", "forged")).await;
        assert_eq!(location(&response), "/login");
        Ok(())
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_gates_roles() -> Result<()> {
        let state = test_state().await?;
        create_test_user(&state.db, "w", UserRole::Warden, Some("X"), true).await?;

        let response = login(&state, "w").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/warden");
        let token = token_from(&response);

        let response = send(&state, get_with_cookie("/warden", &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["hostels"].as_array().unwrap().is_empty());

        let response = send(&state, get_with_cookie("/admin", &token)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        Ok(())
    }

    #[tokio::test]
    async fn test_login_failures() -> Result<()> {
        let state = test_state().await?;
        create_test_user(&state.db, "p", UserRole::Student, Some("X"), false).await?;

        let response = login(&state, "p").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key(header::SET_COOKIE));

        let response = login(&state, "ghost").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_ends_session() -> Result<()> {
        let state = test_state().await?;
        create_test_user(&state.db, "s", UserRole::Student, Some("X"), true).await?;
        let token = token_from(&login(&state, "s").await);

        let response = send(&state, get_with_cookie("/logout", &token)).await;
        assert_eq!(location(&response), "/login");

        let response = send(&state, get_with_cookie("/student", &token)).await;
        assert_eq!(location(&response), "/login");
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_and_allocate_over_http() -> Result<()> {
        let state = test_state().await?;
        let warden = approved_warden(&state.db, "w", "X").await?;
        let alpha = create_test_hostel(&state.db, &warden, "Alpha", 1).await?;
        create_test_user(&state.db, "p", UserRole::Principal, Some("X"), true).await?;
        create_test_user(&state.db, "s", UserRole::Student, Some("X"), true).await?;

        let student = token_from(&login(&state, "s").await);
        let response = send(
            &state,
            get_with_cookie(&format!("/student/apply/{}", alpha.id), &student),
        )
        .await;
        assert_eq!(location(&response), "/student");

        let principal = token_from(&login(&state, "p").await);
        let review = json_body(send(&state, get_with_cookie("/principal", &principal)).await).await;
        let application_id = review["applications"][0]["id"].as_i64().unwrap();

        let response = send(
            &state,
            get_with_cookie(
                &format!("/principal/approve_hostel/{application_id}"),
                &principal,
            ),
        )
        .await;
        assert_eq!(location(&response), "/principal");

        let stored = Application::find_by_id(application_id)
            .one(&state.db)
            .await?
            .unwrap();
        assert_eq!(stored.status, ApplicationStatus::Approved);
        assert_eq!(free_room_count(&state.db, alpha.id).await?, 0);

        let dashboard = json_body(send(&state, get_with_cookie("/student", &student)).await).await;
        assert_eq!(dashboard["applications"][0]["room_number"], "R1");
        Ok(())
    }

    #[tokio::test]
    async fn test_student_registration_over_multipart() -> Result<()> {
        let state = test_state().await?;
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"username\"\r\n\r\nnew\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"password\"\r\n\r\npw\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"college\"\r\n\r\nX\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"id_card\"; filename=\"card.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n\
             --{boundary}--\r\n"
        );
        let response = send(
            &state,
            Request::post("/register/student")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        let response = login_with(&state, "new", "pw").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &state,
            Request::get("/register/admin").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }

    #[tokio::test]
    async fn test_uploads_require_session() -> Result<()> {
        let state = test_state().await?;
        let name = state
            .blobs
            .save(&crate::storage::Upload {
                filename: "room.png".to_string(),
                bytes: b"png".to_vec(),
            })
            .await?;
        create_test_user(&state.db, "s", UserRole::Student, Some("X"), true).await?;

        let uri = format!("/uploads/{name}");
        let response = send(&state, Request::get(&uri).body(Body::empty()).unwrap()).await;
        assert_eq!(location(&response), "/login");

        let token = token_from(&login(&state, "s").await);
        let response = send(&state, get_with_cookie(&uri, &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let response = send(&state, get_with_cookie("/uploads/missing.png", &token)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
