// Analysis domain model - Validated verdict returned by the analysis service
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the uploaded CSV as echoed back by the analysis service.
/// Column order is the order the service sent.
pub type SampleRecord = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    #[serde(alias = "normal")]
    Normal,
    #[serde(alias = "Anomalia", alias = "anomaly")]
    Anomaly,
}

/// Every field is optional; absence only suppresses the matching view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub total_rows: Option<u64>,
    pub anomaly_count: Option<u64>,
    pub normal_count: Option<u64>,
    /// As reported by the service, within 0..=100. Never recomputed here.
    pub anomaly_percentage: Option<f64>,
    pub latency_column: Option<String>,
    pub current_series: Option<Vec<f64>>,
    pub baseline_series: Option<Vec<f64>>,
    pub sample: Vec<SampleRecord>,
    /// Base64 PNG, without a data URL prefix
    pub chart_image_png: Option<String>,
}

impl AnalysisResult {
    pub fn has_latency_series(&self) -> bool {
        self.current_series.is_some() || self.baseline_series.is_some()
    }

    pub fn has_sample(&self) -> bool {
        !self.sample.is_empty()
    }
}
