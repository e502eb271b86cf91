//! Application Configuration

use platform::rate_limit::RateLimitConfig;
use std::time::Duration;

/// Gate application configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Task TTL from creation to passive expiry
    pub task_ttl: Duration,
    /// Mandatory wait between code generation and code reveal
    pub dwell: Duration,
    /// Verification code length
    pub code_length: usize,
    /// Fixed code accepted regardless of the stored one. Absent unless
    /// explicitly configured; meant for demo/test operation only.
    pub bypass_code: Option<String>,
    /// Per-fingerprint rate limit on assignment and verification
    pub rate_limit: RateLimitConfig,
    /// Test kind reported when the session row is missing
    pub default_test_kind: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            task_ttl: Duration::from_secs(30 * 60),
            dwell: Duration::from_secs(60),
            code_length: 6,
            bypass_code: None,
            rate_limit: RateLimitConfig::default(),
            default_test_kind: "iq".to_string(),
        }
    }
}

impl GateConfig {
    /// Create config for development (bypass code enabled)
    pub fn development() -> Self {
        Self {
            bypass_code: Some("DEMO123".to_string()),
            ..Default::default()
        }
    }

    pub fn task_ttl_ms(&self) -> i64 {
        self.task_ttl.as_millis() as i64
    }

    pub fn dwell_ms(&self) -> i64 {
        self.dwell.as_millis() as i64
    }

    pub fn dwell_seconds(&self) -> u64 {
        self.dwell.as_secs()
    }
}
