//! Sampled page text: the payload of one analysis request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which part of the page a sample was taken from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SampleScope {
    /// Whole visible page
    FullPage,
    /// Subtree around the last click target
    Subtree,
}

/// One extracted page-text sample. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampledText {
    pub text: String,
    pub source_url: String,
    pub timestamp: DateTime<Utc>,
    pub scope: SampleScope,
}
