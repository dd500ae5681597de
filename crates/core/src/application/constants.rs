// Engine constants (no magic values at call sites)
use std::time::Duration;

/// Product ids fetched per job tick
pub const DEFAULT_JOB_BATCH_SIZE: usize = 100;

/// Failure threshold window (3 hours)
pub const DEFAULT_FAILURE_WINDOW_SECS: u64 = 3 * 60 * 60;

/// In-window failures before an item is suppressed from automatic retry
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Grace period for in-flight ticks on dispatcher shutdown (5 seconds)
pub const DISPATCHER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Recent job runs shown by the monitor
pub const DEFAULT_MONITOR_LIMIT: usize = 20;

/// Job names
pub const JOB_DELETE_ALL_PRODUCTS: &str = "delete_all_products";
pub const JOB_SYNC_ALL_PRODUCTS: &str = "sync_all_products";
pub const JOB_UPDATE_PRODUCTS: &str = "update_products";
pub const JOB_DELETE_PRODUCTS: &str = "delete_products";
