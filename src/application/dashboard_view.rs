// Dashboard view - Single task owning the upload, presentation and chart state
use crate::application::chart_renderer::{ChartRendererAdapter, RendererPhase};
use crate::application::result_presenter::{ResultPresenter, ResultView};
use crate::application::submission_client::SubmissionClient;
use crate::application::upload_controller::{Settled, UploadController};
use crate::domain::upload::{FileHandle, Phase};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Error)]
#[error("dashboard view is no longer running")]
pub struct ViewClosed;

#[derive(Debug)]
pub enum ViewCommand {
    SelectFile(FileHandle),
    Submit,
    Snapshot(oneshot::Sender<ViewSnapshot>),
    Teardown,
}

/// Everything the page needs to render, taken at one instant
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub phase: Phase,
    pub file_name: Option<String>,
    pub file_size: Option<usize>,
    pub can_submit: bool,
    pub error: Option<String>,
    pub results: Option<ResultView>,
    pub received_at: Option<DateTime<Utc>>,
    pub chart_phase: RendererPhase,
    pub chart_surface_id: String,
    pub chart_figure: Option<String>,
}

/// Cheap, cloneable way to talk to the view task
#[derive(Clone)]
pub struct DashboardHandle {
    tx: mpsc::Sender<ViewCommand>,
}

impl DashboardHandle {
    pub async fn select_file(&self, file: FileHandle) -> Result<(), ViewClosed> {
        self.send(ViewCommand::SelectFile(file)).await
    }

    pub async fn submit(&self) -> Result<(), ViewClosed> {
        self.send(ViewCommand::Submit).await
    }

    pub async fn snapshot(&self) -> Result<ViewSnapshot, ViewClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(ViewCommand::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| ViewClosed)
    }

    pub async fn teardown(&self) -> Result<(), ViewClosed> {
        self.send(ViewCommand::Teardown).await
    }

    async fn send(&self, command: ViewCommand) -> Result<(), ViewClosed> {
        self.tx.send(command).await.map_err(|_| ViewClosed)
    }
}

struct PresentedResult {
    view: ResultView,
    received_at: DateTime<Utc>,
}

pub struct DashboardView {
    controller: UploadController,
    settled_rx: mpsc::UnboundedReceiver<Settled>,
    presenter: ResultPresenter,
    chart: ChartRendererAdapter,
    presented: Option<PresentedResult>,
}

impl DashboardView {
    pub fn new(
        client: Arc<dyn SubmissionClient>,
        presenter: ResultPresenter,
        chart: ChartRendererAdapter,
    ) -> Self {
        let (controller, settled_rx) = UploadController::new(client);
        Self {
            controller,
            settled_rx,
            presenter,
            chart,
            presented: None,
        }
    }

    /// Run the view on its own task until torn down or every handle is dropped
    pub fn spawn(self) -> (DashboardHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(self.run(rx));
        (DashboardHandle { tx }, task)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<ViewCommand>) {
        tracing::debug!("Dashboard view started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(ViewCommand::Teardown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(settled) = self.settled_rx.recv() => self.apply(settled),
            }
        }

        self.controller.teardown();
        self.chart.teardown();
        tracing::debug!("Dashboard view stopped");
    }

    fn handle(&mut self, command: ViewCommand) {
        match command {
            ViewCommand::SelectFile(file) => self.controller.select_file(file),
            ViewCommand::Submit => {
                if self.controller.submit() {
                    self.presented = None;
                    self.chart.clear();
                }
            }
            ViewCommand::Snapshot(reply) => {
                // The requester may have given up waiting.
                let _ = reply.send(self.snapshot());
            }
            ViewCommand::Teardown => {}
        }
    }

    fn apply(&mut self, settled: Settled) {
        let Some(result) = self.controller.settle(settled) else {
            return;
        };

        let view = self.presenter.present(&result);
        tracing::info!(
            "Analysis received: {} rows, {} anomalies, {} ({:?})",
            view.summary.total_rows,
            view.summary.anomalies,
            view.summary.percentage,
            view.summary.alert
        );

        match view.chart.as_ref().and_then(|chart| chart.live.clone()) {
            Some(request) => {
                // Outcome is logged by the render task
                drop(self.chart.render(request));
            }
            None => self.chart.clear(),
        }

        self.presented = Some(PresentedResult {
            view,
            received_at: Utc::now(),
        });
    }

    fn snapshot(&self) -> ViewSnapshot {
        let state = self.controller.state();
        let file = state.selected_file();

        ViewSnapshot {
            phase: state.phase(),
            file_name: file.map(|f| f.name.clone()),
            file_size: file.map(FileHandle::size),
            can_submit: state.can_submit(),
            error: state.error().map(str::to_owned),
            results: self.presented.as_ref().map(|p| p.view.clone()),
            received_at: self.presented.as_ref().map(|p| p.received_at),
            chart_phase: self.chart.phase(),
            chart_surface_id: self.chart.surface().id().to_string(),
            chart_figure: self.chart.surface().figure(),
        }
    }
}
