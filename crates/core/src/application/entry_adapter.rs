// Catalog Entry Adapter
//
// Turns local product records into remote-ready request entries. Pure
// transformation: validation failures come back as `invalid_payload`
// error records instead of aborting the batch.

use crate::domain::{
    Availability, ErrorRecord, Price, Product, ProductId, ProductType, RequestEntry, SyncState,
};
use serde::Serialize;
use tracing::debug;

/// Attributes sent to the remote catalog for create/update
#[derive(Debug, Clone, Serialize)]
pub struct ProductPayload<'a> {
    pub offer_id: ProductId,
    pub item_group_id: Option<ProductId>,
    pub title: &'a str,
    pub description: &'a str,
    pub link: &'a str,
    pub image_link: &'a str,
    pub price: &'a Price,
    pub availability: Availability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gtin: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpn: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogEntryAdapter;

impl CatalogEntryAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Build create/update entries. Invalid products are returned as
    /// error records and never appear among the entries.
    pub fn build_update_entries(
        &self,
        products: &[Product],
    ) -> (Vec<RequestEntry>, Vec<ErrorRecord>) {
        let mut entries = Vec::with_capacity(products.len());
        let mut invalid = Vec::new();

        for product in products {
            match self.build_payload(product) {
                Ok(payload) => entries.push(RequestEntry::update(product.reference.clone(), payload)),
                Err(message) => {
                    debug!(product_id = product.id(), reason = %message, "Product failed validation");
                    invalid.push(ErrorRecord::invalid_payload(
                        product.reference.clone(),
                        message,
                    ));
                }
            }
        }

        (entries, invalid)
    }

    /// Build delete entries. States without a remote id are skipped
    /// (nothing to delete remotely).
    pub fn build_delete_entries(&self, states: &[SyncState]) -> Vec<RequestEntry> {
        states
            .iter()
            .filter_map(|state| {
                state
                    .remote_id
                    .as_ref()
                    .map(|remote_id| RequestEntry::delete(state.product.clone(), remote_id.clone()))
            })
            .collect()
    }

    fn build_payload(&self, product: &Product) -> Result<serde_json::Value, String> {
        if !product.product_type.is_syncable() {
            return Err(format!(
                "unsupported product type: {}",
                product.product_type
            ));
        }

        let missing = Self::missing_attributes(product);
        if !missing.is_empty() {
            return Err(format!("missing required attributes: {}", missing.join(", ")));
        }

        // Checked above
        let Some(price) = product.price.as_ref() else {
            return Err("missing required attributes: price".to_string());
        };

        let payload = ProductPayload {
            offer_id: product.id(),
            item_group_id: match product.product_type {
                ProductType::Variation => product.reference.parent_id,
                _ => None,
            },
            title: product.title.trim(),
            description: product.description.trim(),
            link: &product.link,
            image_link: &product.image_link,
            price,
            availability: product.availability,
            brand: product.brand.as_deref(),
            gtin: product.gtin.as_deref(),
            mpn: product.sku.as_deref(),
        };

        serde_json::to_value(payload).map_err(|e| format!("payload serialization failed: {}", e))
    }

    fn missing_attributes(product: &Product) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if product.title.trim().is_empty() {
            missing.push("title");
        }
        if product.link.trim().is_empty() {
            missing.push("link");
        }
        if product.image_link.trim().is_empty() {
            missing.push("image_link");
        }
        match &product.price {
            None => missing.push("price"),
            Some(price) => {
                if price.amount_minor < 0 {
                    missing.push("price (negative amount)");
                }
                if price.currency.len() != 3 || !price.currency.chars().all(|c| c.is_ascii_alphabetic()) {
                    missing.push("price currency");
                }
            }
        }
        if product.product_type == ProductType::Variation && product.reference.parent_id.is_none() {
            missing.push("parent_id");
        }
        missing
    }
}
