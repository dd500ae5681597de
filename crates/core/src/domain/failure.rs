// Failure records for the rolling-window threshold tracker

use super::product::ProductId;
use serde::{Deserialize, Serialize};

/// One recorded failure of one product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub product_id: ProductId,
    pub failed_at: i64, // epoch ms
}

impl FailureRecord {
    pub fn new(product_id: ProductId, failed_at: i64) -> Self {
        Self {
            product_id,
            failed_at,
        }
    }
}

/// In-window summary derived from the stored records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureWindow {
    pub product_id: ProductId,
    pub attempts: u32,
    pub first_failure_at: Option<i64>,
}

impl FailureWindow {
    pub fn from_records(product_id: ProductId, records: &[FailureRecord]) -> Self {
        Self {
            product_id,
            attempts: records.len() as u32,
            first_failure_at: records.iter().map(|record| record.failed_at).min(),
        }
    }

    /// When the oldest in-window failure drops out
    pub fn rolls_over_at(&self, window_ms: i64) -> Option<i64> {
        self.first_failure_at.map(|first| first + window_ms)
    }
}
