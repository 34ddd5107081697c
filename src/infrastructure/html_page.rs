// HTML rendering of the dashboard page from a view snapshot
use crate::application::chart_renderer::RendererPhase;
use crate::application::dashboard_view::ViewSnapshot;
use crate::application::result_presenter::{ChartView, Percentage, ResultView, SummaryView, TableView, format_percent};
use crate::domain::alert::AlertLevel;
use crate::domain::upload::Phase;
use std::fmt::Write;

pub const CHART_LIBRARY_PATH: &str = "/assets/chart.js";

const STYLE: &str = r#"
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#f4f4f5;color:#18181b;margin:0}
.container{max-width:960px;margin:0 auto;padding:24px}
.card{background:#fff;border:1px solid #e4e4e7;border-radius:8px;padding:20px;margin-top:16px}
h1{font-size:1.5rem;margin:0 0 4px}h2{font-size:1.2rem;margin:0 0 12px}h3{font-size:1rem;margin:0 0 8px}
.muted{color:#71717a}
.btn{display:inline-block;padding:8px 14px;border-radius:6px;border:1px solid #d4d4d8;background:#fff;cursor:pointer}
.btn-primary{background:#2563eb;border-color:#2563eb;color:#fff}
.btn:disabled{opacity:.5;cursor:not-allowed}
form{display:flex;gap:12px;align-items:center;flex-wrap:wrap}
.metrics{display:grid;grid-template-columns:repeat(auto-fit,minmax(160px,1fr));gap:12px}
.metric .label{font-size:.85rem;color:#71717a}.metric .value{font-size:1.2rem;font-weight:600}
.alert{margin-top:16px;padding:12px;border-radius:6px}
.alert-danger{background:#fee2e2;color:#991b1b}.alert-ok{background:#dcfce7;color:#166534}
.alert-muted{background:#f4f4f5;color:#52525b}
table{border-collapse:collapse;width:100%;font-size:.85rem}
th,td{border-bottom:1px solid #e4e4e7;padding:4px 8px;text-align:left}
.table-wrap{overflow-x:auto}
img.chart{max-width:100%;border:1px solid #e4e4e7;border-radius:6px}
"#;

const FILE_INPUT_SCRIPT: &str = r#"
const input = document.getElementById("file-input");
const button = document.getElementById("upload-button");
input.addEventListener("change", () => {
  button.disabled = input.files.length === 0 || button.dataset.busy === "true";
});
"#;

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Figure JSON embedded in a script element must not close it early
fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

pub fn render_page(snapshot: &ViewSnapshot) -> String {
    let submitting = snapshot.phase == Phase::Submitting;
    let waiting_for_chart = snapshot.chart_phase == RendererPhase::Polling;

    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n");
    if submitting || waiting_for_chart {
        html.push_str("<meta http-equiv=\"refresh\" content=\"1\">\n");
    }
    html.push_str("<title>Load-Test Anomaly Dashboard</title>\n");
    let _ = write!(html, "<style>{}</style>\n</head>\n<body>\n<div class=\"container\">\n", STYLE);

    render_upload_card(&mut html, snapshot, submitting);

    if let Some(error) = &snapshot.error {
        let _ = write!(
            html,
            "<div class=\"alert alert-danger\" role=\"alert\">{}</div>\n",
            escape_html(error)
        );
    }

    if let Some(results) = &snapshot.results {
        render_results(&mut html, snapshot, results);
    }

    let _ = write!(html, "</div>\n<script>{}</script>\n</body>\n</html>\n", FILE_INPUT_SCRIPT);
    html
}

fn render_upload_card(html: &mut String, snapshot: &ViewSnapshot, submitting: bool) {
    html.push_str("<div class=\"card\">\n<h1>Load-Test Anomaly Dashboard</h1>\n");
    html.push_str(
        "<p class=\"muted\">Upload a CSV produced by JMeter to classify each request as Normal or Anomaly.</p>\n",
    );

    let _ = write!(
        html,
        "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
         <input id=\"file-input\" type=\"file\" name=\"file\" accept=\".csv,text/csv\" required>\n\
         <button id=\"upload-button\" class=\"btn btn-primary\" type=\"submit\" data-busy=\"{}\" disabled>{}</button>\n\
         </form>\n",
        submitting,
        if submitting { "Submitting..." } else { "Upload and analyse" }
    );

    if let Some(name) = &snapshot.file_name {
        let size = snapshot.file_size.unwrap_or_default();
        let _ = write!(
            html,
            "<form method=\"post\" action=\"/submit\" style=\"margin-top:12px\">\n\
             <span class=\"muted\">Selected: {} ({} bytes)</span>\n\
             <button class=\"btn\" type=\"submit\"{}>Analyse again</button>\n\
             </form>\n",
            escape_html(name),
            size,
            if snapshot.can_submit { "" } else { " disabled" }
        );
    }

    html.push_str("</div>\n");
}

fn render_results(html: &mut String, snapshot: &ViewSnapshot, results: &ResultView) {
    html.push_str("<div class=\"card\">\n<h2>Results</h2>\n");
    if let Some(received_at) = snapshot.received_at {
        let _ = write!(
            html,
            "<p class=\"muted\">Analysed at {}</p>\n",
            received_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    render_summary(html, &results.summary);
    html.push_str("</div>\n");

    if let Some(chart) = &results.chart {
        render_chart(html, snapshot, chart);
    }

    render_table(html, &results.table);
}

fn render_summary(html: &mut String, summary: &SummaryView) {
    html.push_str("<div class=\"metrics\">\n");
    metric(html, "Total rows", &summary.total_rows.to_string());
    metric(html, "Anomalies", &summary.anomalies.to_string());
    metric(html, "Normal", &summary.normal.to_string());
    metric(html, "Anomaly rate", &summary.percentage.to_string());
    if let Some(column) = &summary.latency_column {
        metric(html, "Latency column", column);
    }
    html.push_str("</div>\n");

    let threshold = format_percent(summary.threshold);
    let (class, message) = match (summary.alert, summary.percentage) {
        (_, Percentage::NoData) => (
            "alert-muted",
            "No anomaly rate reported; cannot compare against the threshold".to_string(),
        ),
        (AlertLevel::Danger, _) => (
            "alert-danger",
            format!("High anomaly rate detected (above {}%)", threshold),
        ),
        (AlertLevel::Ok, _) => (
            "alert-ok",
            format!("Within normal range (at most {}%)", threshold),
        ),
    };
    let _ = write!(html, "<div class=\"alert {}\" role=\"status\">{}</div>\n", class, message);
}

fn metric(html: &mut String, label: &str, value: &str) {
    let _ = write!(
        html,
        "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>\n",
        escape_html(label),
        escape_html(value)
    );
}

fn render_chart(html: &mut String, snapshot: &ViewSnapshot, chart: &ChartView) {
    let live_figure = chart.live.as_ref().and(snapshot.chart_figure.as_ref());
    let waiting = chart.live.is_some() && snapshot.chart_phase == RendererPhase::Polling;

    if chart.image_png.is_none() && live_figure.is_none() && !waiting {
        // Chart could not be drawn; the rest of the panel stands on its own
        return;
    }

    html.push_str("<div class=\"card\">\n<h3>Latency trend</h3>\n");

    if let Some(image) = &chart.image_png {
        let _ = write!(
            html,
            "<img class=\"chart\" alt=\"Latency chart\" src=\"data:image/png;base64,{}\">\n",
            escape_html(image)
        );
    }

    let surface_id = escape_html(&snapshot.chart_surface_id);
    if let Some(figure) = live_figure {
        let _ = write!(
            html,
            "<div id=\"{id}\"></div>\n\
             <script src=\"{src}\"></script>\n\
             <script>const figure = {figure};\nPlotly.newPlot(\"{id}\", figure.data, figure.layout, {{responsive: true}});</script>\n",
            id = surface_id,
            src = CHART_LIBRARY_PATH,
            figure = escape_script_json(figure)
        );
    } else if waiting {
        let _ = write!(html, "<div id=\"{}\" class=\"muted\">Loading chart...</div>\n", surface_id);
    }

    html.push_str("</div>\n");
}

fn render_table(html: &mut String, table: &TableView) {
    if table.columns.is_empty() {
        return;
    }

    html.push_str("<div class=\"card\">\n<h3>Sample rows</h3>\n<div class=\"table-wrap\"><table>\n<thead><tr>");
    for column in &table.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody></table></div>\n</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::result_presenter::ResultPresenter;
    use crate::domain::alert::DEFAULT_THRESHOLD_PERCENT;
    use crate::domain::analysis::AnalysisResult;
    use serde_json::json;

    fn snapshot(results: Option<ResultView>) -> ViewSnapshot {
        ViewSnapshot {
            phase: Phase::Succeeded,
            file_name: Some("run.csv".to_string()),
            file_size: Some(42),
            can_submit: true,
            error: None,
            results,
            received_at: None,
            chart_phase: RendererPhase::Unloaded,
            chart_surface_id: "latency-chart".to_string(),
            chart_figure: None,
        }
    }

    fn present(result: AnalysisResult) -> ResultView {
        ResultPresenter::new(DEFAULT_THRESHOLD_PERCENT).present(&result)
    }

    fn with_chart() -> AnalysisResult {
        AnalysisResult {
            total_rows: Some(200),
            anomaly_count: Some(25),
            anomaly_percentage: Some(12.5),
            current_series: Some(vec![1.0, 2.0]),
            sample: vec![json!({"label": "<home>", "elapsed": 120}).as_object().unwrap().clone()],
            ..Default::default()
        }
    }

    #[test]
    fn test_renders_summary_and_danger_alert() {
        let page = render_page(&snapshot(Some(present(with_chart()))));
        assert!(page.contains("<div class=\"value\">200</div>"));
        assert!(page.contains("<div class=\"value\">25</div>"));
        assert!(page.contains("<div class=\"value\">12.5%</div>"));
        assert!(page.contains("alert-danger"));
        assert!(page.contains("above 5%"));
    }

    #[test]
    fn test_missing_percentage_shows_no_data() {
        let page = render_page(&snapshot(Some(present(AnalysisResult {
            total_rows: Some(50),
            ..Default::default()
        }))));
        assert!(page.contains("<div class=\"value\">no data</div>"));
        assert!(page.contains("alert-muted"));
        assert!(!page.contains("0%</div>"));
    }

    #[test]
    fn test_table_cells_are_escaped() {
        let page = render_page(&snapshot(Some(present(with_chart()))));
        assert!(page.contains("<th>label</th><th>elapsed</th>"));
        assert!(page.contains("<td>&lt;home&gt;</td>"));
    }

    #[test]
    fn test_unavailable_chart_is_omitted_but_table_remains() {
        let page = render_page(&snapshot(Some(present(with_chart()))));
        assert!(!page.contains("Latency trend"));
        assert!(!page.contains(CHART_LIBRARY_PATH));
        assert!(page.contains("Sample rows"));
    }

    #[test]
    fn test_rendered_chart_embeds_figure() {
        let mut snap = snapshot(Some(present(with_chart())));
        snap.chart_phase = RendererPhase::Rendered;
        snap.chart_figure = Some(r#"{"data":[],"layout":{"title":{"text":"</script>"}}}"#.to_string());

        let page = render_page(&snap);
        assert!(page.contains("<div id=\"latency-chart\"></div>"));
        assert!(page.contains(CHART_LIBRARY_PATH));
        assert!(page.contains("<\\/script>"));
        assert!(page.contains("Plotly.newPlot(\"latency-chart\""));
    }

    #[test]
    fn test_polling_chart_shows_placeholder_and_refreshes() {
        let mut snap = snapshot(Some(present(with_chart())));
        snap.chart_phase = RendererPhase::Polling;

        let page = render_page(&snap);
        assert!(page.contains("Loading chart..."));
        assert!(page.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_submitting_disables_resubmit_and_refreshes() {
        let mut snap = snapshot(None);
        snap.phase = Phase::Submitting;
        snap.can_submit = false;

        let page = render_page(&snap);
        assert!(page.contains("Submitting..."));
        assert!(page.contains("data-busy=\"true\""));
        assert!(page.contains("Analyse again</button>") && page.contains(" disabled>Analyse again"));
        assert!(page.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_error_is_escaped_alert() {
        let mut snap = snapshot(None);
        snap.phase = Phase::Failed;
        snap.error = Some("Failed to analyse file: <b>500</b>".to_string());

        let page = render_page(&snap);
        assert!(page.contains("role=\"alert\">Failed to analyse file: &lt;b&gt;500&lt;/b&gt;</div>"));
        assert!(!page.contains("http-equiv=\"refresh\""));
    }
}
