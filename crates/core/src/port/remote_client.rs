// Remote Catalog Client Port
// Abstraction over the remote advertising catalog API (wire schema lives behind it)

use crate::domain::{BatchResult, RequestEntry};
use async_trait::async_trait;
use thiserror::Error;

/// Transport/protocol failures of a whole batch call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),
}

/// Remote Catalog Client trait
///
/// Contract: a call either fails as a whole (`RemoteError`) or reports every
/// submitted entry exactly once, as a success or as an `ErrorRecord`.
#[async_trait]
pub trait RemoteCatalogClient: Send + Sync {
    /// Maximum number of entries accepted by one batch call
    fn max_batch_size(&self) -> usize;

    /// Create or update the given entries
    async fn insert_batch(&self, entries: &[RequestEntry]) -> Result<BatchResult, RemoteError>;

    /// Delete the given entries (each carries its remote id)
    async fn delete_batch(&self, entries: &[RequestEntry]) -> Result<BatchResult, RemoteError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::{EntryKind, ErrorCode, ErrorRecord, ProductId, SyncedItem};
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// One recorded call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedCall {
        pub kind: EntryKind,
        pub product_ids: Vec<ProductId>,
    }

    #[derive(Default)]
    struct MockState {
        calls: Vec<RecordedCall>,
        item_errors: HashMap<ProductId, (ErrorCode, String)>,
        failing_calls: HashSet<usize>,
    }

    /// Mock remote client. Every entry succeeds with remote id
    /// `remote-{id}` unless an item error or a failing call is configured.
    pub struct MockRemoteClient {
        max_batch_size: usize,
        state: Arc<Mutex<MockState>>,
    }

    impl MockRemoteClient {
        pub fn new(max_batch_size: usize) -> Self {
            Self {
                max_batch_size,
                state: Arc::new(Mutex::new(MockState::default())),
            }
        }

        /// Report `id` with the given error code on every call
        pub fn fail_item(&self, id: ProductId, code: ErrorCode, message: impl Into<String>) {
            self.state
                .lock()
                .unwrap()
                .item_errors
                .insert(id, (code, message.into()));
        }

        pub fn clear_item_errors(&self) {
            self.state.lock().unwrap().item_errors.clear();
        }

        /// Make the n-th call (1-based, counted across insert and delete) raise a transport error
        pub fn fail_call(&self, call_number: usize) {
            self.state.lock().unwrap().failing_calls.insert(call_number);
        }

        pub fn call_count(&self) -> usize {
            self.state.lock().unwrap().calls.len()
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.state.lock().unwrap().calls.clone()
        }

        /// Sizes of every submitted chunk in call order
        pub fn chunk_sizes(&self) -> Vec<usize> {
            self.calls()
                .iter()
                .map(|call| call.product_ids.len())
                .collect()
        }

        /// All product ids that reached the client
        pub fn submitted_ids(&self) -> Vec<ProductId> {
            self.calls()
                .into_iter()
                .flat_map(|call| call.product_ids)
                .collect()
        }

        fn respond(
            &self,
            kind: EntryKind,
            entries: &[RequestEntry],
        ) -> Result<BatchResult, RemoteError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(RecordedCall {
                kind,
                product_ids: entries.iter().map(|entry| entry.product.id).collect(),
            });

            let call_number = state.calls.len();
            if state.failing_calls.contains(&call_number) {
                return Err(RemoteError::Transport(format!(
                    "connection reset on call {}",
                    call_number
                )));
            }

            let mut result = BatchResult::default();
            for entry in entries {
                match state.item_errors.get(&entry.product.id) {
                    Some((code, message)) => result.errors.push(ErrorRecord::new(
                        entry.product.clone(),
                        *code,
                        message.clone(),
                    )),
                    None => {
                        let remote_id = entry
                            .remote_id
                            .clone()
                            .unwrap_or_else(|| format!("remote-{}", entry.product.id));
                        result
                            .succeeded
                            .push(SyncedItem::new(entry.product.clone(), remote_id));
                    }
                }
            }
            Ok(result)
        }
    }

    #[async_trait]
    impl RemoteCatalogClient for MockRemoteClient {
        fn max_batch_size(&self) -> usize {
            self.max_batch_size
        }

        async fn insert_batch(
            &self,
            entries: &[RequestEntry],
        ) -> Result<BatchResult, RemoteError> {
            self.respond(EntryKind::CreateOrUpdate, entries)
        }

        async fn delete_batch(
            &self,
            entries: &[RequestEntry],
        ) -> Result<BatchResult, RemoteError> {
            self.respond(EntryKind::Delete, entries)
        }
    }
}
