// Catalog Sync Infrastructure - SQLite Adapter
// Implements: SyncStateStore, FailureStore, JobRepository

mod connection;
mod error;
mod failure_repository;
mod job_repository;
mod migration;
mod sync_state_repository;

pub use connection::create_pool;
pub use failure_repository::SqliteFailureRepository;
pub use job_repository::SqliteJobRepository;
pub use migration::{current_version, run_migrations};
pub use sync_state_repository::SqliteSyncStateRepository;

// Composition roots hold the pool without depending on sqlx directly
pub use sqlx::SqlitePool;
