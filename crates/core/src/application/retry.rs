// Retry policy (explicit extension point for automatic retries)
use crate::config::RetryConfig;
use crate::domain::{ErrorCode, ErrorRecord, SyncKind};
use tracing::debug;

/// Decides which item errors are retried automatically
pub trait RetryPolicy: Send + Sync {
    /// Whether an error code is transient
    fn is_retryable(&self, code: ErrorCode) -> bool;

    /// Final say over a retry of `errors` (all retryable, not suppressed)
    fn should_retry(&self, kind: SyncKind, errors: &[ErrorRecord]) -> bool;
}

/// Retry policy driven by `RetryConfig`
///
/// - `internal_error` is always retryable
/// - `invalid_payload` never is (needs a content fix)
/// - `rate_limited` and `other` are opt-in
pub struct ConfiguredRetryPolicy {
    config: RetryConfig,
}

impl ConfiguredRetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Policy that never signals a retry
    pub fn disabled() -> Self {
        Self::new(RetryConfig {
            retry_updates: false,
            retry_deletes: false,
            ..RetryConfig::default()
        })
    }
}

impl Default for ConfiguredRetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy for ConfiguredRetryPolicy {
    fn is_retryable(&self, code: ErrorCode) -> bool {
        match code {
            ErrorCode::InternalError => true,
            ErrorCode::InvalidPayload => false,
            ErrorCode::RateLimited => self.config.retry_rate_limited,
            ErrorCode::Other => self.config.retry_other,
        }
    }

    fn should_retry(&self, kind: SyncKind, errors: &[ErrorRecord]) -> bool {
        let enabled = match kind {
            SyncKind::Update => self.config.retry_updates,
            SyncKind::Delete => self.config.retry_deletes,
        };
        if !enabled {
            debug!(kind = %kind, items = errors.len(), "Automatic retry disabled by policy");
        }
        enabled && !errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductRef;

    #[test]
    fn test_default_retryable_codes() {
        let policy = ConfiguredRetryPolicy::default();
        assert!(policy.is_retryable(ErrorCode::InternalError));
        assert!(!policy.is_retryable(ErrorCode::InvalidPayload));
        assert!(!policy.is_retryable(ErrorCode::RateLimited));
        assert!(!policy.is_retryable(ErrorCode::Other));
    }

    #[test]
    fn test_opt_in_codes() {
        let policy = ConfiguredRetryPolicy::new(RetryConfig {
            retry_rate_limited: true,
            retry_other: true,
            ..RetryConfig::default()
        });
        assert!(policy.is_retryable(ErrorCode::RateLimited));
        assert!(policy.is_retryable(ErrorCode::Other));
        assert!(!policy.is_retryable(ErrorCode::InvalidPayload));
    }

    #[test]
    fn test_should_retry_per_kind() {
        let errors = vec![ErrorRecord::new(
            ProductRef::id_only(55),
            ErrorCode::InternalError,
            "boom",
        )];

        let policy = ConfiguredRetryPolicy::new(RetryConfig {
            retry_deletes: false,
            ..RetryConfig::default()
        });
        assert!(policy.should_retry(SyncKind::Update, &errors));
        assert!(!policy.should_retry(SyncKind::Delete, &errors));
        assert!(!policy.should_retry(SyncKind::Update, &[]));
        assert!(!ConfiguredRetryPolicy::disabled().should_retry(SyncKind::Update, &errors));
    }
}
