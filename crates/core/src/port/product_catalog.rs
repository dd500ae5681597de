// Product Catalog Port
// The host platform's native product storage (read-only from the engine's side)

use crate::domain::{BatchWindow, Product, ProductId};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// One page of local product ids in a stable order
    async fn page_ids(&self, window: BatchWindow) -> Result<Vec<ProductId>>;

    /// Load products by id; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryProductCatalog {
        products: Mutex<BTreeMap<ProductId, Product>>,
    }

    impl InMemoryProductCatalog {
        pub fn new(products: Vec<Product>) -> Self {
            Self {
                products: Mutex::new(products.into_iter().map(|p| (p.id(), p)).collect()),
            }
        }

        pub fn upsert(&self, product: Product) {
            self.products.lock().unwrap().insert(product.id(), product);
        }
    }

    #[async_trait]
    impl ProductCatalog for InMemoryProductCatalog {
        async fn page_ids(&self, window: BatchWindow) -> Result<Vec<ProductId>> {
            Ok(self
                .products
                .lock()
                .unwrap()
                .keys()
                .skip(window.offset())
                .take(window.size)
                .copied()
                .collect())
        }

        async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
            let products = self.products.lock().unwrap();
            Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
        }
    }
}
