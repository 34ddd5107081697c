// HTTP submission client - Multipart upload to the analysis service
use crate::application::submission_client::{SubmissionClient, SubmissionError};
use crate::domain::analysis::AnalysisResult;
use crate::domain::upload::FileHandle;
use crate::infrastructure::analysis_payload::decode_analysis;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::{Duration, Instant};

const CSV_MIME: &str = "text/csv";

#[derive(Debug, Clone)]
pub struct HttpSubmissionClient {
    client: reqwest::Client,
    endpoint: String,
    file_field: String,
}

impl HttpSubmissionClient {
    pub fn new(endpoint: String, file_field: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the analysis service")?;

        Ok(Self {
            client,
            endpoint,
            file_field,
        })
    }

    fn build_form(&self, file: &FileHandle) -> Result<Form, SubmissionError> {
        // Shares the upload buffer instead of copying it
        let part = Part::stream_with_length(file.bytes.clone(), file.size() as u64)
            .file_name(file.name.clone())
            .mime_str(CSV_MIME)
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        Ok(Form::new().part(self.file_field.clone(), part))
    }
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    async fn send(&self, file: &FileHandle) -> Result<AnalysisResult, SubmissionError> {
        let started = Instant::now();
        let form = self.build_form(file)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                "Analysis service answered {} for {} after {:?}",
                status,
                file.name,
                started.elapsed()
            );
            return Err(SubmissionError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        tracing::info!(
            "Analysis service answered {} for {} ({} bytes) in {:?}",
            status,
            file.name,
            body.len(),
            started.elapsed()
        );

        decode_analysis(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/classify", addr)
    }

    /// Echoes what it received so the test can check the request shape
    async fn echo_classify(mut multipart: Multipart) -> impl IntoResponse {
        let mut fields = Vec::new();
        let mut rows = 0u64;
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let text = field.text().await.unwrap();
            rows = text.lines().skip(1).count() as u64;
            fields.push(format!("{}:{}:{}", name, file_name, content_type));
        }

        Json(json!({
            "n_rows": rows,
            "pct_anom": 50.0,
            "latency_col": fields.join(";"),
        }))
    }

    fn client(endpoint: String) -> HttpSubmissionClient {
        HttpSubmissionClient::new(endpoint, "file".to_string(), Duration::from_secs(5)).unwrap()
    }

    fn csv() -> FileHandle {
        FileHandle::new("run.csv", "label,elapsed\nhome,120\nlogin,900\n")
    }

    #[tokio::test]
    async fn test_sends_single_file_field() {
        let endpoint = spawn_backend(Router::new().route("/api/classify", post(echo_classify))).await;

        let result = client(endpoint).send(&csv()).await.unwrap();
        assert_eq!(result.total_rows, Some(2));
        assert_eq!(result.anomaly_percentage, Some(50.0));
        assert_eq!(result.latency_column.as_deref(), Some("file:run.csv:text/csv"));
    }

    #[tokio::test]
    async fn test_large_upload_arrives_intact() {
        let endpoint = spawn_backend(Router::new().route("/api/classify", post(echo_classify))).await;
        let mut body = String::from("label,elapsed\n");
        for i in 0..5000 {
            body.push_str(&format!("home,{}\n", i));
        }
        let file = FileHandle::new("big.csv", body);

        let result = client(endpoint).send(&file).await.unwrap();
        assert_eq!(result.total_rows, Some(5000));
    }

    #[tokio::test]
    async fn test_server_error_is_transport_failure() {
        let router = Router::new().route(
            "/api/classify",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
        );
        let endpoint = spawn_backend(router).await;

        let err = client(endpoint).send(&csv()).await.unwrap_err();
        assert!(err.is_transport());
        assert!(
            matches!(err, SubmissionError::HttpStatus { status: 500, ref body } if body == "model crashed")
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_failure() {
        let router = Router::new().route("/api/classify", post(|| async { "<html>ok</html>" }));
        let endpoint = spawn_backend(router).await;

        let err = client(endpoint).send(&csv()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}/api/classify", addr))
            .send(&csv())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Transport(_)));
    }
}
