// Analysis service response decoding and validation
use crate::application::submission_client::SubmissionError;
use crate::domain::analysis::{AnalysisResult, Classification, SampleRecord};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::Value;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Response body of `POST /api/classify`, plus the field names of the older
/// upload endpoint. A canonical field wins when both are present.
#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    n_rows: Option<u64>,
    #[serde(default)]
    total_amostras: Option<u64>,
    #[serde(default)]
    anomalies: Option<u64>,
    #[serde(default)]
    anomalias: Option<u64>,
    #[serde(default)]
    pct_anom: Option<Value>,
    #[serde(default)]
    percentual: Option<Value>,
    #[serde(default)]
    labels: Option<Vec<Classification>>,
    #[serde(default)]
    latency_col: Option<String>,
    #[serde(default)]
    current_series: Option<Vec<f64>>,
    #[serde(default)]
    baseline_series: Option<Vec<f64>>,
    #[serde(default)]
    sample: Option<Vec<SampleRecord>>,
    #[serde(default)]
    chart_image_base64: Option<String>,
    #[serde(default)]
    grafico_latencia_base64: Option<String>,
    #[serde(default)]
    isolation_forest: Option<IsolationForestSummary>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IsolationForestSummary {
    #[serde(default)]
    anomalies: Option<u64>,
    #[serde(default)]
    anomalias: Option<u64>,
    #[serde(default)]
    percentage: Option<Value>,
    #[serde(default)]
    percentual: Option<Value>,
}

/// Decode and validate a response body
pub fn decode_analysis(body: &[u8]) -> Result<AnalysisResult, SubmissionError> {
    let payload: AnalysisPayload =
        serde_json::from_slice(body).map_err(|e| SubmissionError::Decode(e.to_string()))?;

    if let Some(error) = payload.error.filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s,
            other => other.to_string(),
        };
        return Err(SubmissionError::Rejected(message));
    }

    let (forest_anomalies, forest_percentage) = payload
        .isolation_forest
        .map(|f| (f.anomalies.or(f.anomalias), f.percentage.or(f.percentual)))
        .unwrap_or((None, None));

    let labels = payload.labels.unwrap_or_default();
    let labelled = |class: Classification| -> Option<u64> {
        (!labels.is_empty()).then(|| labels.iter().filter(|&&l| l == class).count() as u64)
    };

    let total_rows = payload
        .n_rows
        .or(payload.total_amostras)
        .or_else(|| (!labels.is_empty()).then_some(labels.len() as u64));
    let anomaly_count = payload
        .anomalies
        .or(payload.anomalias)
        .or(forest_anomalies)
        .or_else(|| labelled(Classification::Anomaly));
    let normal_count = labelled(Classification::Normal)
        .or_else(|| total_rows.zip(anomaly_count).and_then(|(t, a)| t.checked_sub(a)));

    let anomaly_percentage = payload
        .pct_anom
        .or(payload.percentual)
        .or(forest_percentage)
        .and_then(|value| parse_percentage(&value));

    Ok(AnalysisResult {
        total_rows,
        anomaly_count,
        normal_count,
        anomaly_percentage,
        latency_column: payload.latency_col.filter(|c| !c.is_empty()),
        current_series: payload.current_series.filter(|s| !s.is_empty()),
        baseline_series: payload.baseline_series.filter(|s| !s.is_empty()),
        sample: payload.sample.unwrap_or_default(),
        chart_image_png: payload
            .chart_image_base64
            .or(payload.grafico_latencia_base64)
            .and_then(|s| validate_png(&s)),
    })
}

/// Numbers and numeric strings within 0..=100; anything else is "no data"
fn parse_percentage(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(pct) if pct.is_finite() && (0.0..=100.0).contains(&pct) => Some(pct),
        _ => {
            tracing::warn!("Ignoring unusable anomaly percentage: {}", value);
            None
        }
    }
}

fn validate_png(encoded: &str) -> Option<String> {
    let encoded = encoded.trim();
    let encoded = encoded.strip_prefix(DATA_URL_PREFIX).unwrap_or(encoded);
    if encoded.is_empty() {
        return None;
    }

    match STANDARD.decode(encoded) {
        Ok(bytes) if bytes.starts_with(PNG_SIGNATURE) => Some(encoded.to_string()),
        Ok(_) => {
            tracing::warn!("Dropping chart image: not a PNG");
            None
        }
        Err(e) => {
            tracing::warn!("Dropping chart image: {}", e);
            None
        }
    }
}
