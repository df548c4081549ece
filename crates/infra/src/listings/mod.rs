//! Listing update pipelines.
//!
//! Both managers run the same three stages:
//!
//! ```text
//! target id
//!   ↓
//! 1. Resolve target (product / variant), NOT_FOUND on `id` if missing
//!   ↓
//! 2. Clean: structural duplicate checks, then identifier resolution
//!   ↓
//! 3. Validate: business rules on the cleaned input
//!   ↓
//! 4. Reconcile: one atomic commit of upserts/deletes
//! ```
//!
//! Failures from stages 2 and 3 are accumulated into one [`ValidationReport`]; the
//! commit only runs when the report is empty. Duplicate violations short-circuit
//! identifier resolution.

mod product_channel_listing_update;
mod variant_channel_listing_update;

pub use product_channel_listing_update::ProductChannelListingUpdate;
pub use variant_channel_listing_update::VariantChannelListingUpdate;

use serde::Serialize;
use thiserror::Error;

use storefront_catalog::{
    Product, ProductChannelListing, ProductVariant, ValidationReport, VariantChannelListing,
};

use crate::resolver::NodeResolver;
use crate::store::{CatalogReader, StoreError};

#[derive(Debug, Error)]
pub enum ListingUpdateError {
    /// Input or business-rule failures. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] ValidationReport),

    /// Reads or the reconcile commit failed. Nothing was written.
    #[error("listing store failure: {0}")]
    Store(#[from] StoreError),
}

/// An updated node, not scoped to any particular channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelContext<T> {
    pub node: T,
    pub channel_slug: Option<String>,
}

impl<T> ChannelContext<T> {
    pub fn unscoped(node: T) -> Self {
        Self {
            node,
            channel_slug: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductListingsView {
    pub product: Product,
    pub listings: Vec<ProductChannelListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantListingsView {
    pub variant: ProductVariant,
    pub listings: Vec<VariantChannelListing>,
}

/// Load a product and its listing rows by global id.
pub async fn product_view<R>(reader: &R, raw_id: &str) -> Result<Option<ProductListingsView>, StoreError>
where
    R: CatalogReader + ?Sized,
{
    let Some(product) = NodeResolver::new(reader).product(raw_id).await? else {
        return Ok(None);
    };
    let listings = reader.product_listings(product.id).await?;
    Ok(Some(ProductListingsView { product, listings }))
}

/// Load a variant and its price rows by global id.
pub async fn variant_view<R>(reader: &R, raw_id: &str) -> Result<Option<VariantListingsView>, StoreError>
where
    R: CatalogReader + ?Sized,
{
    let Some(variant) = NodeResolver::new(reader).variant(raw_id).await? else {
        return Ok(None);
    };
    let listings = reader.variant_listings(variant.id).await?;
    Ok(Some(VariantListingsView { variant, listings }))
}
