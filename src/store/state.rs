//! The shared store document.
//!
//! One flat document holds everything the extension persists. This crate
//! only reads the profile and settings fields and owns the analysis cache
//! map; the rest of the document belongs to out-of-scope subsystems and is
//! round-tripped untouched via `extra`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::RawInsight;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// None until the onboarding wizard finishes
    pub onboarding_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub primary_goal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub analysis_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            analysis_enabled: true,
        }
    }
}

/// One cached analysis result. The fingerprint is the map key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub insight: RawInsight,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub user_profile: UserProfile,
    #[serde(default)]
    pub settings: UserSettings,
    #[serde(default)]
    pub llm_analysis_cache: HashMap<String, CacheEntry>,
    /// Fields owned by other subsystems, preserved across rewrites
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
