// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::chart_renderer::{ChartRendererAdapter, capability_slot};
use crate::application::dashboard_view::DashboardView;
use crate::application::result_presenter::ResultPresenter;
use crate::domain::chart::ChartSurface;
use crate::infrastructure::chart_library::{ChartLibraryAsset, ChartLibraryLoader};
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_submission_client::HttpSubmissionClient;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::build_router;

const DEFAULT_LOG_FILTER: &str = "loadtest_dashboard=info,tower_http=info";
const CHART_SURFACE_ID: &str = "latency-chart";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Submission client (infrastructure layer)
    let client = Arc::new(HttpSubmissionClient::new(
        config.backend.endpoint.clone(),
        config.backend.file_field.clone(),
        config.backend.timeout(),
    )?);

    // Charting capability, loaded in the background
    let (publisher, slot) = capability_slot();
    let chart_assets = ChartLibraryAsset::default();
    ChartLibraryLoader::new(
        config.chart.library_url.clone(),
        config.chart.library_timeout(),
        chart_assets.clone(),
        publisher,
    )?
    .spawn();

    // Dashboard view (application layer)
    let chart = ChartRendererAdapter::new(
        slot,
        ChartSurface::new(CHART_SURFACE_ID),
        config.chart.poll_policy(),
    );
    let view = DashboardView::new(
        client,
        ResultPresenter::new(config.alerts.threshold_percent),
        chart,
    );
    let (view_handle, view_task) = view.spawn();

    let state = Arc::new(AppState {
        view: view_handle.clone(),
        chart_library: chart_assets,
    });

    // Build router (presentation layer)
    let app = build_router(state, config.server.max_upload_bytes());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    tracing::info!(
        "Starting loadtest-dashboard on {} (analysis service: {})",
        listener.local_addr()?,
        config.backend.endpoint
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Tear the view down: stops chart polling and any in-flight submission
    if view_handle.teardown().await.is_err() {
        tracing::warn!("Dashboard view already stopped");
    }
    view_task.await.context("Dashboard view task panicked")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
