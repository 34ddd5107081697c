use crate::application::chart_renderer::PollPolicy;
use crate::domain::alert::DEFAULT_THRESHOLD_PERCENT;
use anyhow::Context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BACKEND_ENDPOINT: &str = "http://127.0.0.1:8000/api/classify";
pub const DEFAULT_CHART_LIBRARY_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub alerts: AlertSettings,
    pub chart: ChartSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub max_upload_mb: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub endpoint: String,
    pub file_field: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertSettings {
    pub threshold_percent: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    pub library_url: String,
    pub library_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

impl ServerSettings {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ChartSettings {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
        }
    }

    pub fn library_timeout(&self) -> Duration {
        Duration::from_secs(self.library_timeout_secs)
    }
}

impl DashboardConfig {
    fn validate(self) -> anyhow::Result<Self> {
        let threshold = self.alerts.threshold_percent;
        anyhow::ensure!(
            threshold.is_finite() && (0.0..=100.0).contains(&threshold),
            "alerts.threshold_percent must be within 0..=100, got {}",
            threshold
        );
        anyhow::ensure!(!self.backend.endpoint.trim().is_empty(), "backend.endpoint is empty");
        anyhow::ensure!(!self.backend.file_field.trim().is_empty(), "backend.file_field is empty");
        anyhow::ensure!(self.chart.poll_interval_ms > 0, "chart.poll_interval_ms must be positive");
        Ok(self)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.bind_addr", "127.0.0.1:3000")?
        .set_default("server.max_upload_mb", 50_i64)?
        .set_default("backend.endpoint", DEFAULT_BACKEND_ENDPOINT)?
        .set_default("backend.file_field", "file")?
        .set_default("backend.timeout_secs", 60_i64)?
        .set_default("alerts.threshold_percent", DEFAULT_THRESHOLD_PERCENT)?
        .set_default("chart.library_url", DEFAULT_CHART_LIBRARY_URL)?
        .set_default("chart.library_timeout_secs", 30_i64)?
        .set_default("chart.poll_interval_ms", 250_i64)?
        .set_default("chart.max_poll_attempts", 40_i64)
}

/// Defaults, then `config/dashboard.*` if present, then `DASHBOARD__*` env vars
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = defaults()?
        .add_source(File::with_name("config/dashboard").required(false))
        .add_source(
            Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to load dashboard configuration")?;

    settings
        .try_deserialize::<DashboardConfig>()
        .context("Invalid dashboard configuration")?
        .validate()
}
