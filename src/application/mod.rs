// Application layer - Upload workflow, presentation and chart rendering
pub mod chart_renderer;
pub mod dashboard_view;
pub mod result_presenter;
pub mod submission_client;
pub mod upload_controller;
