// Domain layer - Upload lifecycle, analysis results and chart models
pub mod alert;
pub mod analysis;
pub mod chart;
pub mod upload;
