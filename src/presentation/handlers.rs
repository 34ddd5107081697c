// HTTP request handlers
use crate::application::dashboard_view::ViewClosed;
use crate::domain::upload::FileHandle;
use crate::infrastructure::html_page::render_page;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;

impl IntoResponse for ViewClosed {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Render the dashboard page
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ViewClosed> {
    let snapshot = state.view.snapshot().await?;
    Ok(Html(render_page(&snapshot)))
}

/// Current view as JSON
pub async fn view_json(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ViewClosed> {
    Ok(Json(state.view.snapshot().await?))
}

/// Select a file without submitting it
pub async fn select_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Redirect, Response> {
    if let Some(file) = read_file_field(multipart).await.map_err(bad_form)? {
        state.view.select_file(file).await.map_err(IntoResponse::into_response)?;
    }
    Ok(Redirect::to("/"))
}

/// Select a file and submit it in one step (the upload form)
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Redirect, Response> {
    // Without a new file this is a no-op: submit stays blocked
    if let Some(file) = read_file_field(multipart).await.map_err(bad_form)? {
        state.view.select_file(file).await.map_err(IntoResponse::into_response)?;
        state.view.submit().await.map_err(IntoResponse::into_response)?;
    }
    Ok(Redirect::to("/"))
}

/// Submit the already selected file again
pub async fn resubmit(State(state): State<Arc<AppState>>) -> Result<Redirect, ViewClosed> {
    state.view.submit().await?;
    Ok(Redirect::to("/"))
}

/// Charting library, once the background loader has fetched it
pub async fn chart_library(State(state): State<Arc<AppState>>) -> Response {
    match state.chart_library.get() {
        Some(script) => (
            [
                (header::CONTENT_TYPE, "application/javascript"),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            script,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// First multipart field carrying a named file. Browsers send an empty file
/// name when nothing was picked.
async fn read_file_field(mut multipart: Multipart) -> Result<Option<FileHandle>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if file_name.is_empty() {
            continue;
        }

        let bytes = field.bytes().await?;
        return Ok(Some(FileHandle::new(file_name, bytes)));
    }
    Ok(None)
}

fn bad_form(e: MultipartError) -> Response {
    tracing::warn!("Rejected upload form: {}", e);
    (StatusCode::BAD_REQUEST, format!("Invalid upload form: {}", e)).into_response()
}
