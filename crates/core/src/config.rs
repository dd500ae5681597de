// Engine configuration, passed into each component at construction

use crate::application::constants::{
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_FAILURE_WINDOW_SECS, DEFAULT_JOB_BATCH_SIZE,
};
use serde::{Deserialize, Serialize};

/// Tunables for the batch sync engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Entries per remote call. Capped by the client's own maximum;
    /// `None` means use the client maximum as-is.
    pub chunk_size: Option<usize>,

    /// Product ids fetched per job tick
    pub job_batch_size: usize,

    /// Sliding window for the failure threshold tracker (seconds)
    pub failure_window_secs: u64,

    /// In-window failures after which an item stops being retried
    pub failure_threshold: u32,

    pub retry: RetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: None,
            job_batch_size: DEFAULT_JOB_BATCH_SIZE,
            failure_window_secs: DEFAULT_FAILURE_WINDOW_SECS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn failure_window_ms(&self) -> i64 {
        (self.failure_window_secs as i64).saturating_mul(1000)
    }

    /// Resolve the effective chunk size against the client's hard limit
    pub fn effective_chunk_size(&self, client_max: usize) -> usize {
        let max = client_max.max(1);
        self.chunk_size.map_or(max, |size| size.clamp(1, max))
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.job_batch_size == 0 {
            return Err(crate::AppError::Config(
                "job_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.failure_threshold == 0 {
            return Err(crate::AppError::Config(
                "failure_threshold must be greater than zero".to_string(),
            ));
        }
        if self.failure_window_secs == 0 {
            return Err(crate::AppError::Config(
                "failure_window_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Retry toggles. `internal_error` is always retryable and
/// `invalid_payload` never is; the rest are opt-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub retry_updates: bool,
    pub retry_deletes: bool,
    pub retry_rate_limited: bool,
    pub retry_other: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_updates: true,
            retry_deletes: true,
            retry_rate_limited: false,
            retry_other: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_capped_by_client() {
        let mut config = SyncConfig::default();
        assert_eq!(config.effective_chunk_size(1000), 1000);

        config.chunk_size = Some(5);
        assert_eq!(config.effective_chunk_size(1000), 5);

        config.chunk_size = Some(5000);
        assert_eq!(config.effective_chunk_size(1000), 1000);

        config.chunk_size = Some(0);
        assert_eq!(config.effective_chunk_size(1000), 1);
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.failure_window_ms(), 3 * 60 * 60 * 1000);
        assert_eq!(config.failure_threshold, 5);
        assert!(config.retry.retry_updates);
        assert!(!config.retry.retry_rate_limited);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: SyncConfig =
            serde_json::from_value(serde_json::json!({ "job_batch_size": 25 })).unwrap();
        assert_eq!(config.job_batch_size, 25);
        assert_eq!(config.failure_threshold, DEFAULT_FAILURE_THRESHOLD);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = SyncConfig {
            job_batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
