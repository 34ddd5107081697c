// Plotly charting capability - Encodes series as a Plotly figure for the page
use crate::application::chart_renderer::{ChartCapability, ChartError};
use crate::domain::chart::{ChartLayout, ChartSeries, SeriesStyle, SurfaceTarget};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, Default)]
pub struct PlotlyCapability;

impl ChartCapability for PlotlyCapability {
    fn draw(
        &self,
        target: &SurfaceTarget,
        series: &[ChartSeries],
        layout: &ChartLayout,
    ) -> Result<(), ChartError> {
        let figure = figure(series, layout);
        let encoded = serde_json::to_string(&figure).map_err(|e| ChartError::Encode(e.to_string()))?;

        if target.put(encoded) {
            Ok(())
        } else {
            Err(ChartError::Detached(target.id().to_string()))
        }
    }
}

fn figure(series: &[ChartSeries], layout: &ChartLayout) -> Value {
    let data: Vec<Value> = series.iter().map(trace).collect();

    json!({
        "data": data,
        "layout": {
            "title": { "text": layout.title },
            "xaxis": { "title": { "text": layout.x_axis_title } },
            "yaxis": { "title": { "text": layout.y_axis_title } },
            "legend": { "orientation": "h" },
            "margin": { "t": 48, "r": 16, "b": 48, "l": 64 }
        }
    })
}

fn trace(series: &ChartSeries) -> Value {
    let mode = match series.style {
        SeriesStyle::Line => "lines",
        SeriesStyle::LineWithMarkers => "lines+markers",
    };
    let x: Vec<f64> = series.points.iter().map(|p| p.x).collect();
    let y: Vec<f64> = series.points.iter().map(|p| p.y).collect();

    json!({
        "type": "scatter",
        "name": series.name,
        "mode": mode,
        "x": x,
        "y": y
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::ChartSurface;

    fn layout() -> ChartLayout {
        ChartLayout {
            title: "Latency trend (elapsed)".to_string(),
            x_axis_title: "Request #".to_string(),
            y_axis_title: "elapsed".to_string(),
        }
    }

    #[test]
    fn test_draws_current_and_baseline_traces() {
        let surface = ChartSurface::new("latency-chart");
        let series = vec![
            ChartSeries::indexed("Current", SeriesStyle::LineWithMarkers, &[120.0, 130.0, 900.0]),
            ChartSeries::indexed("Baseline", SeriesStyle::Line, &[110.0, 115.0]),
        ];

        PlotlyCapability.draw(&surface.reset(), &series, &layout()).unwrap();

        let figure: Value = serde_json::from_str(&surface.figure().unwrap()).unwrap();
        let data = figure["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);

        assert_eq!(data[0]["name"], "Current");
        assert_eq!(data[0]["mode"], "lines+markers");
        assert_eq!(data[0]["x"], json!([0.0, 1.0, 2.0]));
        assert_eq!(data[0]["y"], json!([120.0, 130.0, 900.0]));

        assert_eq!(data[1]["name"], "Baseline");
        assert_eq!(data[1]["mode"], "lines");
        assert_eq!(data[1]["x"], json!([0.0, 1.0]));

        assert_eq!(figure["layout"]["title"]["text"], "Latency trend (elapsed)");
    }

    #[test]
    fn test_detached_target_is_an_error() {
        let surface = ChartSurface::new("latency-chart");
        let target = surface.reset();
        surface.unmount();

        let err = PlotlyCapability.draw(&target, &[], &layout()).unwrap_err();
        assert!(matches!(err, ChartError::Detached(_)));
    }
}
