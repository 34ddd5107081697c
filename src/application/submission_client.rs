// Submission client trait - Hands an uploaded file to the analysis service
use crate::domain::analysis::AnalysisResult;
use crate::domain::upload::FileHandle;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Network failure: unreachable host, timeout, broken connection
    #[error("analysis service unreachable: {0}")]
    Transport(String),

    #[error("analysis service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("malformed analysis response: {0}")]
    Decode(String),

    /// 2xx response whose body carries an `error` field
    #[error("analysis service rejected the file: {0}")]
    Rejected(String),
}

impl SubmissionError {
    pub fn is_transport(&self) -> bool {
        matches!(self, SubmissionError::Transport(_) | SubmissionError::HttpStatus { .. })
    }

    /// Message shown in the results panel alert
    pub fn user_message(&self) -> String {
        format!("Failed to analyse file: {}", self)
    }
}

#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Send one file, exactly one request, no retries
    async fn send(&self, file: &FileHandle) -> Result<AnalysisResult, SubmissionError>;
}
