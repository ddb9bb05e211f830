use std::time::Duration;

/// Tunable thresholds for the content sampler.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Delay after page load before the first sampling attempt
    pub startup_delay: Duration,

    /// Debounce window for scroll bursts; a newer scroll resets it
    pub scroll_debounce: Duration,

    /// Settle delay after a click so post-click DOM changes land first
    pub click_settle: Duration,

    /// Minimum gap between consecutive outbound analysis requests
    pub cooldown: Duration,

    /// DOM mutations that change fewer characters than this are ignored
    pub mutation_min_len: usize,

    /// Extracted text shorter than this is not worth analyzing
    pub min_relevant_len: usize,

    /// Hard cap on extracted text length (chars)
    pub max_text_len: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(3),
            scroll_debounce: Duration::from_millis(500),
            click_settle: Duration::from_secs(1),
            cooldown: Duration::from_secs(15),
            mutation_min_len: 50,
            min_relevant_len: 100,
            max_text_len: 4000,
        }
    }
}

/// Top-level configuration for the insight pipeline.
#[derive(Debug, Clone)]
pub struct CopilotConfig {
    /// Remote analysis proxy endpoint; empty or placeholder means unconfigured
    pub proxy_endpoint: String,

    /// Deadline for the remote analysis call
    pub remote_timeout: Duration,

    /// Text sent to the proxy is capped at this many chars
    pub remote_text_cap: usize,

    /// Cache entries older than this are misses when serving
    pub cache_ttl_secs: i64,

    /// Startup grooming removes cache entries older than this
    pub evict_horizon_secs: i64,

    pub sampler: SamplerConfig,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            proxy_endpoint: String::new(),
            remote_timeout: Duration::from_secs(10),
            remote_text_cap: 2000,
            cache_ttl_secs: 10 * 60,
            evict_horizon_secs: 24 * 60 * 60,
            sampler: SamplerConfig::default(),
        }
    }
}
