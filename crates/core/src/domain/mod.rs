// Domain Layer - Pure sync entities and invariants

pub mod entry;
pub mod error;
pub mod failure;
pub mod job;
pub mod product;
pub mod status;

// Re-exports
pub use entry::{
    BatchResult, EntryKind, ErrorCode, ErrorRecord, RequestEntry, SyncKind, SyncOutcome,
    SyncedItem,
};
pub use error::DomainError;
pub use failure::{FailureRecord, FailureWindow};
pub use job::{BatchWindow, JobPayload, JobRun, JobRunId, JobState, JobTick};
pub use product::{Availability, Price, Product, ProductId, ProductRef, ProductType};
pub use status::{SyncState, SyncStatus};
