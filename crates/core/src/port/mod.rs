// Port Layer - Interfaces for external collaborators

pub mod failure_store;
pub mod integration;
pub mod job_repository;
pub mod job_scheduler;
pub mod product_catalog;
pub mod remote_client;
pub mod sync_listener;
pub mod sync_state_store;
pub mod time_provider;

// Re-exports
pub use failure_store::FailureStore;
pub use integration::{IntegrationStatus, StaticIntegrationStatus};
pub use job_repository::JobRepository;
pub use job_scheduler::JobScheduler;
pub use product_catalog::ProductCatalog;
pub use remote_client::{RemoteCatalogClient, RemoteError};
pub use sync_listener::SyncListener;
pub use sync_state_store::SyncStateStore;
pub use time_provider::{SystemTimeProvider, TimeProvider};
