// Upload form controller - File selection and the submit lifecycle
use crate::application::submission_client::{SubmissionClient, SubmissionError};
use crate::domain::analysis::AnalysisResult;
use crate::domain::upload::{FileHandle, UploadState};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A finished submission, reported back to the owner of the controller
#[derive(Debug)]
pub struct Settled {
    pub cycle: u64,
    pub outcome: Result<AnalysisResult, SubmissionError>,
}

pub struct UploadController {
    state: UploadState,
    client: Arc<dyn SubmissionClient>,
    settled_tx: mpsc::UnboundedSender<Settled>,
    in_flight: Option<JoinHandle<()>>,
}

impl UploadController {
    /// The receiver yields every finished submission; feed them to `settle`.
    pub fn new(client: Arc<dyn SubmissionClient>) -> (Self, mpsc::UnboundedReceiver<Settled>) {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let controller = Self {
            state: UploadState::default(),
            client,
            settled_tx,
            in_flight: None,
        };
        (controller, settled_rx)
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn select_file(&mut self, file: FileHandle) {
        tracing::debug!("Selected {} ({} bytes)", file.name, file.size());
        self.state.select_file(file);
    }

    /// Start a submission. No-op (returns false) without a selected file or
    /// while one is already in flight.
    pub fn submit(&mut self) -> bool {
        let Some(submission) = self.state.begin_submit() else {
            tracing::debug!("Submit ignored in phase {:?}", self.state.phase());
            return false;
        };

        let client = self.client.clone();
        let settled_tx = self.settled_tx.clone();
        let cycle = submission.cycle;

        tracing::info!(
            "Submitting {} ({} bytes), cycle {}",
            submission.file.name,
            submission.file.size(),
            cycle
        );

        self.in_flight = Some(tokio::spawn(async move {
            let started = Instant::now();
            let outcome = client.send(&submission.file).await;
            tracing::debug!("Cycle {} finished in {:?}", cycle, started.elapsed());
            // The receiver is gone only after teardown.
            let _ = settled_tx.send(Settled { cycle, outcome });
        }));
        true
    }

    /// Apply a finished submission. Returns the new result when this settle
    /// produced one; stale settles are dropped.
    pub fn settle(&mut self, settled: Settled) -> Option<Arc<AnalysisResult>> {
        let Settled { cycle, outcome } = settled;
        let outcome = match outcome {
            Ok(result) => Ok(Arc::new(result)),
            Err(e) => {
                let kind = if e.is_transport() { "transport" } else { "response" };
                tracing::error!("Submission for cycle {} failed ({}): {}", cycle, kind, e);
                Err(e.user_message())
            }
        };

        if !self.state.settle(cycle, outcome) {
            tracing::debug!(
                "Discarded stale response for cycle {} (current {})",
                cycle,
                self.state.cycle()
            );
            return None;
        }

        self.in_flight = None;
        self.state.result().cloned()
    }

    pub fn teardown(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::upload::Phase;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Answers with a fixed outcome once a permit is released
    struct GatedClient {
        calls: AtomicUsize,
        gate: Semaphore,
        status: Option<u16>,
    }

    impl GatedClient {
        fn new(status: Option<u16>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Semaphore::new(0),
                status,
            })
        }
    }

    #[async_trait]
    impl SubmissionClient for GatedClient {
        async fn send(&self, file: &FileHandle) -> Result<AnalysisResult, SubmissionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _permit = self.gate.acquire().await.unwrap();
            match self.status {
                Some(status) => Err(SubmissionError::HttpStatus {
                    status,
                    body: "Internal Server Error".to_string(),
                }),
                None => Ok(AnalysisResult {
                    total_rows: Some(file.size() as u64),
                    ..Default::default()
                }),
            }
        }
    }

    fn csv(name: &str) -> FileHandle {
        FileHandle::new(name, "elapsed\n120\n")
    }

    #[tokio::test]
    async fn test_submit_without_file_is_noop() {
        let client = GatedClient::new(None);
        let (mut controller, _settled) = UploadController::new(client.clone());

        assert!(!controller.submit());
        assert_eq!(controller.state().phase(), Phase::Idle);
        tokio::task::yield_now().await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_double_submit_sends_one_request() {
        let client = GatedClient::new(None);
        let (mut controller, mut settled) = UploadController::new(client.clone());
        controller.select_file(csv("run.csv"));

        assert!(controller.submit());
        assert!(!controller.submit());
        assert_eq!(controller.state().phase(), Phase::Submitting);

        client.gate.add_permits(2);
        let done = settled.recv().await.unwrap();
        let result = controller.settle(done).unwrap();

        assert_eq!(result.total_rows, Some(12));
        assert_eq!(controller.state().phase(), Phase::Succeeded);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_http_error_is_visible_and_keeps_file() {
        let client = GatedClient::new(Some(500));
        let (mut controller, mut settled) = UploadController::new(client.clone());
        controller.select_file(csv("run.csv"));
        controller.submit();

        client.gate.add_permits(1);
        let done = settled.recv().await.unwrap();
        assert!(controller.settle(done).is_none());

        let state = controller.state();
        assert_eq!(state.phase(), Phase::Failed);
        assert!(state.error().unwrap().contains("HTTP 500"));
        assert_eq!(state.selected_file().unwrap().name, "run.csv");

        // Retry without reselecting
        assert!(controller.submit());
        assert_eq!(controller.state().phase(), Phase::Submitting);
    }

    #[tokio::test]
    async fn test_select_and_submit_while_submitting_sends_one_request() {
        let client = GatedClient::new(None);
        let (mut controller, mut settled) = UploadController::new(client.clone());
        controller.select_file(csv("run.csv"));
        assert!(controller.submit());
        let cycle = controller.state().cycle();

        // A second upload form post while the first is in flight
        controller.select_file(FileHandle::new("second-run.csv", "elapsed\n1\n2\n"));
        assert!(!controller.submit());
        controller.select_file(csv("third-run.csv"));
        assert!(!controller.submit());

        tokio::task::yield_now().await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state().phase(), Phase::Submitting);
        assert_eq!(controller.state().cycle(), cycle);

        client.gate.add_permits(1);
        let done = settled.recv().await.unwrap();
        let result = controller.settle(done).unwrap();
        assert_eq!(result.total_rows, Some(12));
        assert_eq!(controller.state().selected_file().unwrap().name, "third-run.csv");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_settle_is_discarded() {
        let client = GatedClient::new(None);
        let (mut controller, _settled) = UploadController::new(client.clone());
        controller.select_file(csv("run.csv"));
        controller.submit();

        let late = Settled {
            cycle: controller.state().cycle() - 1,
            outcome: Ok(AnalysisResult::default()),
        };
        assert!(controller.settle(late).is_none());
        assert_eq!(controller.state().phase(), Phase::Submitting);
    }
}
