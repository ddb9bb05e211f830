//! biascope: the insight acquisition pipeline behind the reading co-pilot.
//!
//! The host extension feeds page events in; the pipeline samples visible
//! text, asks a remote proxy to spot cognitive biases in it, and always
//! delivers *some* card back through the host's `InsightSink` — cached,
//! live, or from the offline catalog.

mod analysis;
mod config;
mod host;
mod models;
mod sampler;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use analysis::{
    fingerprint, parse_response, AnalysisOrchestrator, AnalysisOutcome, AnalysisStatus,
    AnalysisTransport, HttpProxy, InsightCache, OfflineInsightProvider, ProxyError,
};
pub use config::{CopilotConfig, SamplerConfig};
pub use host::{
    ConnectivityProbe, InsightFeedback, InsightSink, NodePath, NodeRect, PageEvent, PageNode,
    PageSnapshot, PageSource, Viewport,
};
pub use models::{
    DisplayableInsight, InsightSource, OfflineInsight, OfflineKind, RawInsight, SampleScope,
    SampledText, PATTERN_NONE,
};
pub use sampler::{extract_visible_text, SamplerController};
pub use store::{CacheEntry, Store, StoreState, UserProfile, UserSettings};

const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// Top-level handle tying the sampler to the orchestrator.
pub struct Copilot {
    config: CopilotConfig,
    store: Store,
    orchestrator: Arc<AnalysisOrchestrator>,
    sampler: SamplerController,
    dispatch: Option<JoinHandle<()>>,
}

impl Copilot {
    /// Open the store, run the one-shot cache grooming pass, and build the
    /// pipeline. The sampler stays idle until `attach` is called with a
    /// page.
    pub async fn init(
        config: CopilotConfig,
        store_path: PathBuf,
        connectivity: Arc<dyn ConnectivityProbe>,
        sink: Arc<dyn InsightSink>,
    ) -> Result<Self> {
        let transport: Arc<dyn AnalysisTransport> = Arc::new(HttpProxy::new(
            config.proxy_endpoint.clone(),
            config.remote_timeout,
        ));
        Self::init_with_transport(config, store_path, transport, connectivity, sink).await
    }

    /// As `init`, with an injected transport. Used by embedders that bring
    /// their own wire layer and by tests.
    pub async fn init_with_transport(
        config: CopilotConfig,
        store_path: PathBuf,
        transport: Arc<dyn AnalysisTransport>,
        connectivity: Arc<dyn ConnectivityProbe>,
        sink: Arc<dyn InsightSink>,
    ) -> Result<Self> {
        let store = Store::open(store_path).context("failed to open extension store")?;

        // Grooming runs once per startup, with a horizon well past the
        // serving TTL.
        let cache = InsightCache::new(store.clone(), config.cache_ttl_secs);
        cache
            .evict_stale(config.evict_horizon_secs, Utc::now())
            .await
            .context("startup cache grooming failed")?;

        let orchestrator = Arc::new(AnalysisOrchestrator::new(
            store.clone(),
            &config,
            transport,
            connectivity,
            OfflineInsightProvider::new(),
            sink,
        ));

        info!("biascope initialized");

        Ok(Self {
            config,
            store,
            orchestrator,
            sampler: SamplerController::new(),
            dispatch: None,
        })
    }

    /// Start sampling a page. Requests flow from the sampler into the
    /// orchestrator on an internal channel; each one runs to completion
    /// and its status is logged.
    pub fn attach(&mut self, page: Arc<dyn PageSource>) -> Result<()> {
        let (request_tx, mut request_rx) = mpsc::channel::<SampledText>(REQUEST_CHANNEL_CAPACITY);

        self.sampler
            .start(page, self.config.sampler.clone(), request_tx)?;

        let orchestrator = self.orchestrator.clone();
        self.dispatch = Some(tokio::spawn(async move {
            while let Some(sample) = request_rx.recv().await {
                let outcome = orchestrator.handle_request(sample).await;
                info!("analysis finished: {}", outcome.status.as_str());
            }
        }));

        Ok(())
    }

    /// Forward one page event to the sampler.
    pub fn notify(&self, event: PageEvent) {
        self.sampler.notify(event);
    }

    /// Run one analysis directly, bypassing the sampler's trigger gating.
    pub async fn analyze(&self, sample: SampledText) -> AnalysisOutcome {
        self.orchestrator.handle_request(sample).await
    }

    /// Feedback reported by the display surface. The gamification subsystem
    /// that consumes it lives outside this crate; the pipeline only logs it.
    pub fn on_feedback(&self, feedback: InsightFeedback) {
        match &feedback {
            InsightFeedback::ChallengeAccepted { related_skill_id, .. } => {
                info!(
                    "challenge accepted (skill: {})",
                    related_skill_id.as_deref().unwrap_or("-")
                );
            }
            InsightFeedback::Dismissed => info!("insight dismissed"),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Stop the sampler and the dispatch task.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.sampler.stop().await?;

        if let Some(handle) = self.dispatch.take() {
            handle.await.context("dispatch task failed to join")?;
        }
        Ok(())
    }
}
