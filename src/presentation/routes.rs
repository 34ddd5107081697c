// Route table for the dashboard
use crate::infrastructure::html_page::CHART_LIBRARY_PATH;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chart_library, health_check, index, resubmit, select_file, upload, view_json,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/select", post(select_file))
        .route("/upload", post(upload))
        .route("/submit", post(resubmit))
        .route("/api/view", get(view_json))
        .route(CHART_LIBRARY_PATH, get(chart_library))
        .route("/healthz", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
