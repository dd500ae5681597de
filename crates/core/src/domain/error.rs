// Domain invariant violations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Job run cannot move from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Stored enum text that no variant matches
    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),

    /// A persisted sync state breaks its own invariants
    #[error("Inconsistent sync state for product {product_id}: {reason}")]
    InconsistentState { product_id: u64, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
