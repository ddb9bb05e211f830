//! Fingerprint-keyed cache of prior analysis results.
//!
//! Entries live inside the shared store document (`llm_analysis_cache`);
//! this module is the data-access layer over it. Serving freshness uses
//! `ttl_secs`; the startup grooming pass uses the longer eviction horizon.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::info;
use sha2::{Digest, Sha256};

use crate::models::RawInsight;
use crate::store::{CacheEntry, Store};

/// Stable cache key over the sampled text, the user's goal and the page URL.
pub fn fingerprint(text: &str, goal: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"\n");
    hasher.update(goal.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Clone)]
pub struct InsightCache {
    store: Store,
    ttl_secs: i64,
}

impl InsightCache {
    pub fn new(store: Store, ttl_secs: i64) -> Self {
        Self { store, ttl_secs }
    }

    /// Raw lookup, no freshness check, no mutation.
    pub async fn lookup(&self, fingerprint: &str) -> Result<Option<CacheEntry>> {
        let state = self.store.get().await?;
        Ok(state.llm_analysis_cache.get(fingerprint).cloned())
    }

    /// Lookup that treats entries older than the TTL as misses. Stale
    /// entries are left in place; grooming removes them later.
    pub async fn fresh_lookup(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>> {
        let entry = self.lookup(fingerprint).await?;
        Ok(entry.filter(|e| now - e.created_at < Duration::seconds(self.ttl_secs)))
    }

    /// Insert or overwrite the entry at `fingerprint`. Last write wins.
    pub async fn put(
        &self,
        fingerprint: String,
        insight: RawInsight,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.store
            .update(move |state| {
                state.llm_analysis_cache.insert(
                    fingerprint,
                    CacheEntry {
                        insight,
                        created_at: now,
                    },
                );
            })
            .await?;
        Ok(())
    }

    /// Grooming pass: drop entries older than `horizon_secs`. Run once per
    /// startup, not per request; the horizon is deliberately longer than the
    /// serving TTL.
    pub async fn evict_stale(&self, horizon_secs: i64, now: DateTime<Utc>) -> Result<usize> {
        let state = self
            .store
            .update(move |state| {
                state
                    .llm_analysis_cache
                    .retain(|_, entry| now - entry.created_at <= Duration::seconds(horizon_secs));
            })
            .await?;

        let remaining = state.llm_analysis_cache.len();
        info!("Cache grooming done, {remaining} entries remain");
        Ok(remaining)
    }
}
