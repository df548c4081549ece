use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, Entity, ProductId, VariantId};

/// A catalog product.
///
/// Only the attributes the listing rules depend on are modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Option<CategoryId>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, category: Option<CategoryId>) -> Self {
        Self {
            id,
            name: name.into(),
            category,
        }
    }

    /// A product without a category cannot be made visible in any channel.
    pub fn can_be_published(&self) -> bool {
        self.category.is_some()
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A purchasable variant of a product. Belongs to exactly one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
}

impl ProductVariant {
    pub fn new(id: VariantId, product_id: ProductId, sku: impl Into<String>) -> Self {
        Self {
            id,
            product_id,
            sku: sku.into(),
        }
    }
}

impl Entity for ProductVariant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
