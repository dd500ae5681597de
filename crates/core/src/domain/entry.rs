// Request entries and batch results exchanged with the remote catalog

use super::product::{ProductId, ProductRef};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Remote operation for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    CreateOrUpdate,
    Delete,
}

/// One item of a batch request. Built fresh per attempt, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEntry {
    pub product: ProductRef,
    pub kind: EntryKind,
    /// Known remote id (always set for deletes)
    pub remote_id: Option<String>,
    /// Serialized product payload (None for deletes)
    pub payload: Option<serde_json::Value>,
}

impl RequestEntry {
    pub fn update(product: ProductRef, payload: serde_json::Value) -> Self {
        Self {
            product,
            kind: EntryKind::CreateOrUpdate,
            remote_id: None,
            payload: Some(payload),
        }
    }

    pub fn delete(product: ProductRef, remote_id: impl Into<String>) -> Self {
        Self {
            product,
            kind: EntryKind::Delete,
            remote_id: Some(remote_id.into()),
            payload: None,
        }
    }

    /// Map of product id to the reference that was submitted
    pub fn id_map(entries: &[RequestEntry]) -> HashMap<ProductId, ProductRef> {
        entries
            .iter()
            .map(|entry| (entry.product.id, entry.product.clone()))
            .collect()
    }
}

/// Per-item remote error code; drives retry eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidPayload,
    InternalError,
    RateLimited,
    Other,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidPayload => write!(f, "invalid_payload"),
            ErrorCode::InternalError => write!(f, "internal_error"),
            ErrorCode::RateLimited => write!(f, "rate_limited"),
            ErrorCode::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub product: ProductRef,
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(product: ProductRef, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            product,
            code,
            message: message.into(),
        }
    }

    pub fn invalid_payload(product: ProductRef, message: impl Into<String>) -> Self {
        Self::new(product, ErrorCode::InvalidPayload, message)
    }
}

/// Successfully synced item with the id the remote catalog assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedItem {
    pub product: ProductRef,
    pub remote_id: String,
}

impl SyncedItem {
    pub fn new(product: ProductRef, remote_id: impl Into<String>) -> Self {
        Self {
            product,
            remote_id: remote_id.into(),
        }
    }
}

/// Outcome of one chunk submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub succeeded: Vec<SyncedItem>,
    pub errors: Vec<ErrorRecord>,
}

impl BatchResult {
    pub fn new(succeeded: Vec<SyncedItem>, errors: Vec<ErrorRecord>) -> Self {
        Self { succeeded, errors }
    }
}

/// Which flow produced an outcome or retry signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Update,
    Delete,
}

impl std::fmt::Display for SyncKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncKind::Update => write!(f, "update"),
            SyncKind::Delete => write!(f, "delete"),
        }
    }
}

/// Final merged result of one synchronization call across all chunks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub succeeded: Vec<SyncedItem>,
    pub failed: Vec<ErrorRecord>,
    #[serde(skip)]
    seen: HashSet<ProductId>,
}

impl SyncOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge a chunk result. The first outcome seen for a product wins.
    pub fn merge(&mut self, result: BatchResult) {
        for item in result.succeeded {
            if self.seen.insert(item.product.id) {
                self.succeeded.push(item);
            }
        }
        self.merge_errors(result.errors);
    }

    pub fn merge_errors(&mut self, errors: Vec<ErrorRecord>) {
        for error in errors {
            if self.seen.insert(error.product.id) {
                self.failed.push(error);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }

    pub fn succeeded_ids(&self) -> Vec<ProductId> {
        self.succeeded.iter().map(|item| item.product.id).collect()
    }

    pub fn failed_ids(&self) -> Vec<ProductId> {
        self.failed.iter().map(|error| error.product.id).collect()
    }
}
