// Chart renderer adapter - Draws latency series once the charting capability loads
use crate::domain::chart::{ChartLayout, ChartRequest, ChartSeries, ChartSurface, SurfaceTarget};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to encode figure: {0}")]
    Encode(String),

    #[error("chart surface {0} no longer accepts drawings")]
    Detached(String),
}

/// An externally loaded drawing function
pub trait ChartCapability: Send + Sync {
    fn draw(
        &self,
        target: &SurfaceTarget,
        series: &[ChartSeries],
        layout: &ChartLayout,
    ) -> Result<(), ChartError>;
}

type SharedCapability = Option<Arc<dyn ChartCapability>>;

/// Publishes the capability once it has loaded
pub struct CapabilityPublisher {
    tx: watch::Sender<SharedCapability>,
}

impl CapabilityPublisher {
    pub fn publish(&self, capability: Arc<dyn ChartCapability>) {
        self.tx.send_replace(Some(capability));
    }
}

/// Read side of the capability; empty until the loader publishes
#[derive(Clone)]
pub struct CapabilitySlot {
    rx: watch::Receiver<SharedCapability>,
}

impl CapabilitySlot {
    pub fn current(&self) -> SharedCapability {
        self.rx.borrow().clone()
    }
}

pub fn capability_slot() -> (CapabilityPublisher, CapabilitySlot) {
    let (tx, rx) = watch::channel(None);
    (CapabilityPublisher { tx }, CapabilitySlot { rx })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Longest time a render waits for the capability
    pub fn bounded_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            max_attempts: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererPhase {
    #[default]
    Unloaded,
    Polling,
    Ready,
    Rendered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// The capability did not load within the bounded wait
    Unavailable,
    Superseded,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Superseded,
    Cancelled,
}

impl From<StopReason> for RenderOutcome {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::Superseded => RenderOutcome::Superseded,
            StopReason::Cancelled => RenderOutcome::Cancelled,
        }
    }
}

pub struct ChartRendererAdapter {
    slot: CapabilitySlot,
    surface: ChartSurface,
    policy: PollPolicy,
    phase: Arc<watch::Sender<RendererPhase>>,
    stop: Option<watch::Sender<Option<StopReason>>>,
    torn_down: bool,
}

impl ChartRendererAdapter {
    pub fn new(slot: CapabilitySlot, surface: ChartSurface, policy: PollPolicy) -> Self {
        let (phase, _) = watch::channel(RendererPhase::Unloaded);
        Self {
            slot,
            surface,
            policy,
            phase: Arc::new(phase),
            stop: None,
            torn_down: false,
        }
    }

    pub fn phase(&self) -> RendererPhase {
        *self.phase.borrow()
    }

    pub fn surface(&self) -> &ChartSurface {
        &self.surface
    }

    /// Render the latest request, superseding any render still waiting for
    /// the capability. Never blocks: waiting happens on a spawned task.
    pub fn render(&mut self, request: ChartRequest) -> JoinHandle<RenderOutcome> {
        if self.torn_down {
            return tokio::spawn(async { RenderOutcome::Cancelled });
        }

        self.stop_current(StopReason::Superseded);
        let target = self.surface.reset();
        let (stop_tx, stop_rx) = watch::channel(None);
        self.stop = Some(stop_tx);
        self.phase.send_replace(RendererPhase::Unloaded);

        let task = RenderTask {
            slot: self.slot.clone(),
            target,
            policy: self.policy,
            phase: self.phase.clone(),
            stop: stop_rx,
        };
        tokio::spawn(task.run(request))
    }

    /// Drop whatever is drawn or pending, e.g. for a result with nothing to plot
    pub fn clear(&mut self) {
        if self.torn_down {
            return;
        }
        self.stop_current(StopReason::Superseded);
        self.surface.reset();
        self.phase.send_replace(RendererPhase::Unloaded);
    }

    /// Stop polling and detach the surface. Later requests are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.stop_current(StopReason::Cancelled);
        self.surface.unmount();
        self.phase.send_replace(RendererPhase::Unloaded);
        tracing::debug!("Chart renderer for {} torn down", self.surface.id());
    }

    fn stop_current(&mut self, reason: StopReason) {
        if let Some(stop) = self.stop.take() {
            // The task may already be done; nobody listening is fine.
            let _ = stop.send(Some(reason));
        }
    }
}

struct RenderTask {
    slot: CapabilitySlot,
    target: SurfaceTarget,
    policy: PollPolicy,
    phase: Arc<watch::Sender<RendererPhase>>,
    stop: watch::Receiver<Option<StopReason>>,
}

impl RenderTask {
    async fn run(mut self, request: ChartRequest) -> RenderOutcome {
        let mut attempts = 0u32;

        loop {
            if let Some(reason) = *self.stop.borrow() {
                return reason.into();
            }

            if let Some(capability) = self.slot.current() {
                return self.draw(capability.as_ref(), &request);
            }

            if attempts == self.policy.max_attempts {
                tracing::warn!(
                    "Charting capability not available after {:?}; omitting chart {}",
                    self.policy.bounded_wait(),
                    self.target.id()
                );
                self.set_phase(RendererPhase::Unloaded);
                return RenderOutcome::Unavailable;
            }

            if attempts == 0 {
                tracing::debug!("Charting capability not loaded yet, polling");
                self.set_phase(RendererPhase::Polling);
            }
            attempts += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.policy.interval) => {}
                changed = self.stop.changed() => {
                    return match changed {
                        Ok(()) => self.stop.borrow().map(RenderOutcome::from).unwrap_or(RenderOutcome::Cancelled),
                        Err(_) => RenderOutcome::Cancelled,
                    };
                }
            }
        }
    }

    fn draw(&self, capability: &dyn ChartCapability, request: &ChartRequest) -> RenderOutcome {
        self.set_phase(RendererPhase::Ready);

        match capability.draw(&self.target, &request.series, &request.layout) {
            Ok(()) => {
                self.set_phase(RendererPhase::Rendered);
                tracing::debug!(
                    "Rendered {} series into {}",
                    request.series.len(),
                    self.target.id()
                );
                RenderOutcome::Rendered
            }
            Err(ChartError::Detached(_)) => self
                .stop
                .borrow()
                .map(RenderOutcome::from)
                .unwrap_or(RenderOutcome::Superseded),
            Err(e) => {
                tracing::warn!("Failed to draw chart {}: {}", self.target.id(), e);
                self.set_phase(RendererPhase::Unloaded);
                RenderOutcome::Failed
            }
        }
    }

    /// Only the render that still owns the surface reports its phase
    fn set_phase(&self, phase: RendererPhase) {
        if self.target.is_current() {
            self.phase.send_replace(phase);
        }
    }
}
