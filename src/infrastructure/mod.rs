// Infrastructure layer - External dependencies and adapters
pub mod analysis_payload;
pub mod chart_library;
pub mod config;
pub mod html_page;
pub mod http_submission_client;
pub mod plotly_capability;
