//! Per-request analysis pipeline.
//!
//! Each sampled text runs the same sequence: authorization, cache,
//! connectivity, configuration, remote call, parse, cache write, delivery.
//! Every terminal branch maps to a distinct `AnalysisStatus` and the
//! orchestrator never returns an error to its caller; any failure along the
//! way degrades to an offline card so the user is never left with nothing.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

use crate::analysis::cache::{fingerprint, InsightCache};
use crate::analysis::offline::OfflineInsightProvider;
use crate::analysis::parser::parse_response;
use crate::analysis::remote::AnalysisTransport;
use crate::config::CopilotConfig;
use crate::host::{ConnectivityProbe, InsightSink};
use crate::models::{DisplayableInsight, RawInsight, SampledText};
use crate::store::Store;

/// Terminal status of one analysis request. The snake_case strings are the
/// contract callers assert on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    OnboardingIncomplete,
    AnalysisDisabled,
    SuccessCached,
    SuccessLive,
    OfflineFallback,
    ConfigFallback,
    ErrorFallback,
    ParseErrorFallback,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::OnboardingIncomplete => "onboarding_incomplete",
            AnalysisStatus::AnalysisDisabled => "analysis_disabled",
            AnalysisStatus::SuccessCached => "success_cached",
            AnalysisStatus::SuccessLive => "success_live",
            AnalysisStatus::OfflineFallback => "offline_fallback",
            AnalysisStatus::ConfigFallback => "config_fallback",
            AnalysisStatus::ErrorFallback => "error_fallback",
            AnalysisStatus::ParseErrorFallback => "parse_error_fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub status: AnalysisStatus,
    /// None only on the authorization-skip branches
    pub delivered: Option<DisplayableInsight>,
}

pub struct AnalysisOrchestrator {
    store: Store,
    cache: InsightCache,
    transport: Arc<dyn AnalysisTransport>,
    connectivity: Arc<dyn ConnectivityProbe>,
    offline: OfflineInsightProvider,
    sink: Arc<dyn InsightSink>,
    remote_text_cap: usize,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Store,
        config: &CopilotConfig,
        transport: Arc<dyn AnalysisTransport>,
        connectivity: Arc<dyn ConnectivityProbe>,
        offline: OfflineInsightProvider,
        sink: Arc<dyn InsightSink>,
    ) -> Self {
        let cache = InsightCache::new(store.clone(), config.cache_ttl_secs);
        Self {
            store,
            cache,
            transport,
            connectivity,
            offline,
            sink,
            remote_text_cap: config.remote_text_cap,
        }
    }

    pub async fn handle_request(&self, sample: SampledText) -> AnalysisOutcome {
        // Authorization: profile and settings gate everything.
        let state = match self.store.get().await {
            Ok(state) => state,
            Err(err) => {
                warn!("Store read failed before analysis: {err:#}");
                return self.deliver_offline(AnalysisStatus::ErrorFallback);
            }
        };

        if state.user_profile.onboarding_completed_at.is_none() {
            info!("Skipping analysis, onboarding not completed");
            return AnalysisOutcome {
                status: AnalysisStatus::OnboardingIncomplete,
                delivered: None,
            };
        }
        if !state.settings.analysis_enabled {
            info!("Skipping analysis, disabled in settings");
            return AnalysisOutcome {
                status: AnalysisStatus::AnalysisDisabled,
                delivered: None,
            };
        }

        let goal = state.user_profile.primary_goal.clone();
        let key = fingerprint(&sample.text, &goal, &sample.source_url);

        // Cache: a fresh entry replaces the remote round trip entirely.
        match self.cache.fresh_lookup(&key, Utc::now()).await {
            Ok(Some(entry)) => {
                info!("Serving cached insight for fingerprint {}", &key[..12]);
                return self.deliver_llm(entry.insight, AnalysisStatus::SuccessCached);
            }
            Ok(None) => {}
            Err(err) => {
                // A broken cache read is not worth losing the request over.
                warn!("Cache lookup failed: {err:#}");
            }
        }

        if !self.connectivity.is_online() {
            info!("Offline, serving catalog insight");
            return self.deliver_offline(AnalysisStatus::OfflineFallback);
        }

        if !self.transport.is_configured() {
            warn!("Analysis proxy endpoint not configured, serving catalog insight");
            return self.deliver_offline(AnalysisStatus::ConfigFallback);
        }

        let capped = truncate_chars(&sample.text, self.remote_text_cap);
        let raw = match self.transport.request_analysis(capped, &goal).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Remote analysis failed: {err}");
                return self.deliver_offline(AnalysisStatus::ErrorFallback);
            }
        };

        let insight = match parse_response(&raw) {
            Some(insight) => insight,
            None => {
                warn!("Proxy reply failed to parse ({} bytes)", raw.len());
                return self.deliver_offline(AnalysisStatus::ParseErrorFallback);
            }
        };

        // Only actionable results are worth replaying later; "nothing found"
        // is delivered but never cached.
        if insight.is_actionable() {
            if let Err(err) = self.cache.put(key, insight.clone(), Utc::now()).await {
                warn!("Cache write failed, delivering anyway: {err:#}");
            }
        }

        self.deliver_llm(insight, AnalysisStatus::SuccessLive)
    }

    fn deliver_llm(&self, insight: RawInsight, status: AnalysisStatus) -> AnalysisOutcome {
        let highlight = insight.highlight_selector.clone();
        let card = DisplayableInsight::from_raw(insight, Utc::now());

        self.sink.deliver(card.clone());
        if let Some(selector) = highlight {
            self.sink.apply_highlight(&selector);
        }

        AnalysisOutcome {
            status,
            delivered: Some(card),
        }
    }

    fn deliver_offline(&self, status: AnalysisStatus) -> AnalysisOutcome {
        let entry = self.offline.pick();
        let card = DisplayableInsight::from_offline(&entry, Utc::now());
        self.sink.deliver(card.clone());

        AnalysisOutcome {
            status,
            delivered: Some(card),
        }
    }
}

/// Truncate to at most `max` chars without splitting a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
