// Catalog Sync Core - Domain Logic, Ports & Sync Engine
// NO infrastructure dependencies (hexagonal layout)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use config::{RetryConfig, SyncConfig};
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
