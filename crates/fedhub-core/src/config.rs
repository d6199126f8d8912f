//! Hub configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::time::Duration;

/// Top-level configuration for the hub's trust/validation core.
#[derive(Debug, Clone)]
pub struct Config {
    /// Metadata and trust-anchor refresh configuration.
    pub metadata: MetadataConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            metadata: MetadataConfig::from_env()?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata: MetadataConfig::default(),
        }
    }
}

/// Configuration for counterparty metadata and trust-anchor refresh.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    /// Base URI under which per-counterparty metadata is published.
    pub metadata_base_uri: String,

    /// URI of the trust-anchor document.
    pub trust_anchor_uri: String,

    /// Minimum delay before the next trust-anchor refresh, in milliseconds.
    ///
    /// Used after a failed refresh and when a trusted certificate is close
    /// to expiry.
    pub trust_anchor_min_refresh_delay_ms: u64,

    /// Maximum delay before the next trust-anchor refresh, in milliseconds.
    ///
    /// The optimistic default for a healthy refresh cycle.
    pub trust_anchor_max_refresh_delay_ms: u64,
}

impl MetadataConfig {
    /// Loads metadata configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `FEDHUB_METADATA_BASE_URI` or
    /// `FEDHUB_TRUST_ANCHOR_URI` is missing.
    pub fn from_env() -> anyhow::Result<Self> {
        let metadata_base_uri = std::env::var("FEDHUB_METADATA_BASE_URI")
            .map_err(|_| anyhow::anyhow!("FEDHUB_METADATA_BASE_URI environment variable is required"))?;

        let trust_anchor_uri = std::env::var("FEDHUB_TRUST_ANCHOR_URI")
            .map_err(|_| anyhow::anyhow!("FEDHUB_TRUST_ANCHOR_URI environment variable is required"))?;

        let trust_anchor_min_refresh_delay_ms = std::env::var("FEDHUB_TRUST_ANCHOR_MIN_REFRESH_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60_000); // 1 minute

        let trust_anchor_max_refresh_delay_ms = std::env::var("FEDHUB_TRUST_ANCHOR_MAX_REFRESH_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(21_600_000); // 6 hours

        Ok(Self {
            metadata_base_uri,
            trust_anchor_uri,
            trust_anchor_min_refresh_delay_ms,
            trust_anchor_max_refresh_delay_ms,
        })
    }

    /// Creates a configuration for testing with short refresh delays.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            metadata_base_uri: "http://localhost:8080/metadata".to_string(),
            trust_anchor_uri: "http://localhost:8080/trust-anchor".to_string(),
            trust_anchor_min_refresh_delay_ms: 10,
            trust_anchor_max_refresh_delay_ms: 1_000,
        }
    }

    /// Returns the minimum refresh delay as a [`Duration`].
    #[must_use]
    pub const fn min_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.trust_anchor_min_refresh_delay_ms)
    }

    /// Returns the maximum refresh delay as a [`Duration`].
    #[must_use]
    pub const fn max_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.trust_anchor_max_refresh_delay_ms)
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            metadata_base_uri: "http://localhost:8080/metadata".to_string(),
            trust_anchor_uri: "http://localhost:8080/trust-anchor".to_string(),
            trust_anchor_min_refresh_delay_ms: 60_000,
            trust_anchor_max_refresh_delay_ms: 21_600_000,
        }
    }
}
