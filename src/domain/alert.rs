// Alert domain model - Anomaly rate versus the configured threshold
use serde::Serialize;

/// Anomaly percentage above which the dashboard raises a visible alert
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Ok,
    Danger,
}

impl AlertLevel {
    /// A missing percentage counts as 0 here; callers display it as "no data".
    pub fn classify(percentage: Option<f64>, threshold: f64) -> Self {
        if percentage.unwrap_or(0.0) > threshold {
            AlertLevel::Danger
        } else {
            AlertLevel::Ok
        }
    }
}
