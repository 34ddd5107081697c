// Result presenter - Maps an analysis result onto the results panel views
use crate::domain::alert::AlertLevel;
use crate::domain::analysis::{AnalysisResult, SampleRecord};
use crate::domain::chart::{ChartLayout, ChartRequest, ChartSeries, SeriesStyle};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A count that may be missing from the service response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Metric {
    Count(u64),
    NoData,
}

impl From<Option<u64>> for Metric {
    fn from(value: Option<u64>) -> Self {
        value.map(Metric::Count).unwrap_or(Metric::NoData)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Count(n) => write!(f, "{}", n),
            Metric::NoData => f.write_str("no data"),
        }
    }
}

/// Reported anomaly percentage. `NoData` must never render as "0%".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Percentage {
    Reported(f64),
    NoData,
}

impl Percentage {
    pub fn value(&self) -> Option<f64> {
        match self {
            Percentage::Reported(v) => Some(*v),
            Percentage::NoData => None,
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percentage::Reported(v) => write!(f, "{}%", format_percent(*v)),
            Percentage::NoData => f.write_str("no data"),
        }
    }
}

/// Two decimals, trailing zeros dropped: 12.5, 2, 0.33
pub fn format_percent(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub total_rows: Metric,
    pub anomalies: Metric,
    pub normal: Metric,
    pub percentage: Percentage,
    pub alert: AlertLevel,
    pub threshold: f64,
    pub latency_column: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub live: Option<ChartRequest>,
    pub image_png: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub summary: SummaryView,
    pub table: TableView,
    pub chart: Option<ChartView>,
}

#[derive(Debug, Clone, Copy)]
pub struct ResultPresenter {
    threshold: f64,
}

impl ResultPresenter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn present(&self, result: &AnalysisResult) -> ResultView {
        ResultView {
            summary: self.summary(result),
            table: Self::table(&result.sample),
            chart: Self::chart(result),
        }
    }

    fn summary(&self, result: &AnalysisResult) -> SummaryView {
        let percentage = result
            .anomaly_percentage
            .map(Percentage::Reported)
            .unwrap_or(Percentage::NoData);

        SummaryView {
            total_rows: result.total_rows.into(),
            anomalies: result.anomaly_count.into(),
            normal: result.normal_count.into(),
            percentage,
            alert: AlertLevel::classify(percentage.value(), self.threshold),
            threshold: self.threshold,
            latency_column: result.latency_column.clone(),
        }
    }

    fn table(sample: &[SampleRecord]) -> TableView {
        let Some(first) = sample.first() else {
            return TableView::default();
        };

        let columns: Vec<String> = first.keys().cloned().collect();
        let rows = sample
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).map(format_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        TableView { columns, rows }
    }

    /// Only renderable with sample rows and something to plot or show
    fn chart(result: &AnalysisResult) -> Option<ChartView> {
        if !result.has_sample() {
            return None;
        }

        let live = result.has_latency_series().then(|| Self::chart_request(result));
        let image_png = result.chart_image_png.clone();

        if live.is_none() && image_png.is_none() {
            return None;
        }

        Some(ChartView { live, image_png })
    }

    fn chart_request(result: &AnalysisResult) -> ChartRequest {
        let mut series = Vec::new();
        if let Some(current) = &result.current_series {
            series.push(ChartSeries::indexed("Current", SeriesStyle::LineWithMarkers, current));
        }
        if let Some(baseline) = &result.baseline_series {
            series.push(ChartSeries::indexed("Baseline", SeriesStyle::Line, baseline));
        }

        let column = result.latency_column.as_deref().unwrap_or("latency");
        ChartRequest {
            series,
            layout: ChartLayout {
                title: format!("Latency trend ({})", column),
                x_axis_title: "Request #".to_string(),
                y_axis_title: column.to_string(),
            },
        }
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
