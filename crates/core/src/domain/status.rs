// Sync Status Domain Model

use super::entry::{ErrorRecord, SyncedItem};
use super::error::{DomainError, Result};
use super::product::{ProductId, ProductRef};
use serde::{Deserialize, Serialize};

/// Reconciliation state of one local product relative to the remote catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Unsynced,
    Pending,
    Synced,
    Invalid,
}

impl SyncStatus {
    pub const ALL: [SyncStatus; 4] = [
        SyncStatus::Unsynced,
        SyncStatus::Pending,
        SyncStatus::Synced,
        SyncStatus::Invalid,
    ];
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Unsynced => write!(f, "UNSYNCED"),
            SyncStatus::Pending => write!(f, "PENDING"),
            SyncStatus::Synced => write!(f, "SYNCED"),
            SyncStatus::Invalid => write!(f, "INVALID"),
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "UNSYNCED" => Ok(SyncStatus::Unsynced),
            "PENDING" => Ok(SyncStatus::Pending),
            "SYNCED" => Ok(SyncStatus::Synced),
            "INVALID" => Ok(SyncStatus::Invalid),
            other => Err(DomainError::UnknownValue {
                kind: "sync status",
                value: other.to_string(),
            }),
        }
    }
}

/// Persisted sync state of one product
///
/// Invariants (enforced by the constructors):
/// - `Synced` always carries a remote id
/// - `Invalid` always carries the last error message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub product: ProductRef,
    pub status: SyncStatus,
    pub remote_id: Option<String>,
    /// Product version that was last accepted remotely
    pub synced_version: Option<String>,
    pub synced_at: Option<i64>, // epoch ms
    pub last_error: Option<String>,
    pub updated_at: i64, // epoch ms
}

impl SyncState {
    pub fn synced(item: &SyncedItem, now_millis: i64) -> Self {
        Self {
            product: item.product.clone(),
            status: SyncStatus::Synced,
            remote_id: Some(item.remote_id.clone()),
            synced_version: Some(item.product.version.clone()),
            synced_at: Some(now_millis),
            last_error: None,
            updated_at: now_millis,
        }
    }

    /// Invalid state; a previously assigned remote id is kept so the
    /// remote copy can still be deleted later
    pub fn invalid(error: &ErrorRecord, previous: Option<&SyncState>, now_millis: i64) -> Self {
        Self {
            product: error.product.clone(),
            status: SyncStatus::Invalid,
            remote_id: previous.and_then(|state| state.remote_id.clone()),
            synced_version: previous.and_then(|state| state.synced_version.clone()),
            synced_at: previous.and_then(|state| state.synced_at),
            last_error: Some(format!("[{}] {}", error.code, error.message)),
            updated_at: now_millis,
        }
    }

    pub fn unsynced(product: ProductRef, now_millis: i64) -> Self {
        Self {
            product,
            status: SyncStatus::Unsynced,
            remote_id: None,
            synced_version: None,
            synced_at: None,
            last_error: None,
            updated_at: now_millis,
        }
    }

    pub fn pending(product: ProductRef, previous: Option<&SyncState>, now_millis: i64) -> Self {
        Self {
            product,
            status: SyncStatus::Pending,
            remote_id: previous.and_then(|state| state.remote_id.clone()),
            synced_version: previous.and_then(|state| state.synced_version.clone()),
            synced_at: previous.and_then(|state| state.synced_at),
            last_error: previous.and_then(|state| state.last_error.clone()),
            updated_at: now_millis,
        }
    }

    pub fn id(&self) -> ProductId {
        self.product.id
    }

    /// A remote copy exists that a delete would target
    pub fn has_remote_copy(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Synced and the remote copy matches `version`
    pub fn is_up_to_date(&self, version: &str) -> bool {
        self.status == SyncStatus::Synced && self.synced_version.as_deref() == Some(version)
    }

    /// Check the persisted invariants (used when loading rows)
    pub fn validate(&self) -> Result<()> {
        match self.status {
            SyncStatus::Synced if self.remote_id.is_none() => Err(DomainError::InconsistentState {
                product_id: self.product.id,
                reason: "SYNCED without a remote id".to_string(),
            }),
            SyncStatus::Invalid if self.last_error.is_none() => {
                Err(DomainError::InconsistentState {
                    product_id: self.product.id,
                    reason: "INVALID without an error message".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
