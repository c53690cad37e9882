//! Serves stored blobs to signed-in users.

use super::{AppState, session::CurrentSession};
use crate::errors::Result;
use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Returns the blob `filename` with a content type guessed from its extension.
pub async fn serve_upload(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(filename): Path<String>,
) -> Result<Response> {
    let Some(bytes) = state.blobs.read(&filename).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}
