// Product Domain Model

use serde::{Deserialize, Serialize};

/// Local catalog product identifier
pub type ProductId = u64;

/// Reference to one local catalog item, read once per batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    /// Parent product for variations
    pub parent_id: Option<ProductId>,
    /// Content hash / version of the local record
    pub version: String,
}

impl ProductRef {
    pub fn new(id: ProductId, version: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            version: version.into(),
        }
    }

    pub fn variation(id: ProductId, parent_id: ProductId, version: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
            version: version.into(),
        }
    }

    /// Reference with no known version (lookups keyed by id only)
    pub fn id_only(id: ProductId) -> Self {
        Self::new(id, "")
    }
}

/// Product kind as stored by the host catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Simple,
    Variation,
    External,
    /// Parent of variations; only its variations are listed remotely
    Variable,
    Other(String),
}

impl ProductType {
    pub fn is_syncable(&self) -> bool {
        matches!(
            self,
            ProductType::Simple | ProductType::Variation | ProductType::External
        )
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Simple => write!(f, "simple"),
            ProductType::Variation => write!(f, "variation"),
            ProductType::External => write!(f, "external"),
            ProductType::Variable => write!(f, "variable"),
            ProductType::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// Price in minor units (cents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount_minor: i64,
    pub currency: String,
}

impl Price {
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            amount_minor,
            currency: currency.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
    Preorder,
}

/// Local product record as handed over by the host catalog platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub reference: ProductRef,
    pub product_type: ProductType,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image_link: String,
    pub price: Option<Price>,
    pub availability: Availability,
    pub brand: Option<String>,
    pub gtin: Option<String>,
    pub sku: Option<String>,
}

impl Product {
    /// Minimal simple product; tests and adapters fill in the rest
    pub fn simple(id: ProductId, title: impl Into<String>) -> Self {
        Self {
            reference: ProductRef::new(id, "v1"),
            product_type: ProductType::Simple,
            title: title.into(),
            description: String::new(),
            link: format!("https://shop.example/products/{}", id),
            image_link: format!("https://shop.example/images/{}.jpg", id),
            price: Some(Price::new(1000, "USD")),
            availability: Availability::InStock,
            brand: None,
            gtin: None,
            sku: None,
        }
    }

    pub fn id(&self) -> ProductId {
        self.reference.id
    }
}
