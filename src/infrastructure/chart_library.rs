// Chart library loader - Fetches the charting script in the background
use crate::application::chart_renderer::CapabilityPublisher;
use crate::infrastructure::plotly_capability::PlotlyCapability;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// The loaded script, served to the browser once available
#[derive(Debug, Clone, Default)]
pub struct ChartLibraryAsset {
    script: Arc<OnceLock<Bytes>>,
}

impl ChartLibraryAsset {
    pub fn get(&self) -> Option<Bytes> {
        self.script.get().cloned()
    }

    /// Keep the first script stored; returns false if one was already there
    pub fn store(&self, script: Bytes) -> bool {
        self.script.set(script).is_ok()
    }
}

pub struct ChartLibraryLoader {
    client: reqwest::Client,
    url: String,
    asset: ChartLibraryAsset,
    publisher: CapabilityPublisher,
}

impl ChartLibraryLoader {
    pub fn new(
        url: String,
        timeout: Duration,
        asset: ChartLibraryAsset,
        publisher: CapabilityPublisher,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the chart library")?;

        Ok(Self {
            client,
            url,
            asset,
            publisher,
        })
    }

    /// Load in the background; the capability is published only on success
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if self.url.trim().is_empty() {
                tracing::info!("No chart library configured; live charts disabled");
                return;
            }

            let started = Instant::now();
            match self.fetch().await {
                Ok(script) => {
                    tracing::info!(
                        "Loaded chart library ({} bytes) in {:?}",
                        script.len(),
                        started.elapsed()
                    );
                    if !self.asset.store(script) {
                        tracing::debug!("Chart library already stored");
                    }
                    self.publisher.publish(Arc::new(PlotlyCapability));
                }
                Err(e) => {
                    tracing::warn!("Chart library unavailable, live charts disabled: {:#}", e);
                }
            }
        })
    }

    async fn fetch(&self) -> Result<Bytes> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!("Chart library request failed with status {}", response.status());
        }

        response
            .bytes()
            .await
            .context("Failed to read chart library body")
    }
}
