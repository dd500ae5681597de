// Integration status port: is the remote catalog account set up and connected?

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

#[async_trait]
pub trait IntegrationStatus: Send + Sync {
    async fn is_setup_complete(&self) -> bool;
}

/// Connection flag held in memory (set by whoever owns the account setup)
pub struct StaticIntegrationStatus {
    connected: AtomicBool,
}

impl StaticIntegrationStatus {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    pub fn connected() -> Self {
        Self::new(true)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl IntegrationStatus for StaticIntegrationStatus {
    async fn is_setup_complete(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
