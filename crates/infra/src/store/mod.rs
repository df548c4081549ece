//! Listing persistence.
//!
//! Reads go through [`CatalogReader`]; every mutation of one request is handed to
//! [`ListingStore::commit`] as a single batch and applied atomically.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use storefront_catalog::{
    Channel, Product, ProductChannelListing, ProductVariant, VariantChannelListing,
};
use storefront_core::{ChannelId, ProductId, VariantId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),

    /// A write referenced a product, variant or channel that does not exist.
    #[error("referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("failed to decode stored row: {0}")]
    Decode(String),
}

/// One mutation of a reconcile batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingWrite {
    /// Insert the row, or overwrite the attributes of the row with the same key.
    UpsertProductListing(ProductChannelListing),
    /// Delete the row if present; absent rows are a no-op.
    DeleteProductListing {
        product_id: ProductId,
        channel_id: ChannelId,
    },
    UpsertVariantListing(VariantChannelListing),
}

/// Row counts of a committed batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

#[async_trait::async_trait]
pub trait CatalogReader: Send + Sync {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn get_variant(&self, id: VariantId) -> Result<Option<ProductVariant>, StoreError>;

    /// Channels with the given keys. Unknown keys are skipped.
    async fn get_channels(&self, ids: &[ChannelId]) -> Result<Vec<Channel>, StoreError>;

    /// Channels the product currently has a listing row for.
    async fn product_channel_ids(
        &self,
        product_id: ProductId,
    ) -> Result<HashSet<ChannelId>, StoreError>;

    /// Listing rows of a product, ordered by channel key.
    async fn product_listings(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductChannelListing>, StoreError>;

    /// Price rows of a variant, ordered by channel key.
    async fn variant_listings(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<VariantChannelListing>, StoreError>;
}

#[async_trait::async_trait]
pub trait ListingStore: Send + Sync {
    /// Apply every write or none of them.
    ///
    /// Writes are applied in order. Any failure discards the whole batch.
    async fn commit(&self, writes: Vec<ListingWrite>) -> Result<CommitSummary, StoreError>;
}

#[async_trait::async_trait]
impl<S> CatalogReader for Arc<S>
where
    S: CatalogReader + ?Sized,
{
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get_product(id).await
    }

    async fn get_variant(&self, id: VariantId) -> Result<Option<ProductVariant>, StoreError> {
        (**self).get_variant(id).await
    }

    async fn get_channels(&self, ids: &[ChannelId]) -> Result<Vec<Channel>, StoreError> {
        (**self).get_channels(ids).await
    }

    async fn product_channel_ids(
        &self,
        product_id: ProductId,
    ) -> Result<HashSet<ChannelId>, StoreError> {
        (**self).product_channel_ids(product_id).await
    }

    async fn product_listings(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductChannelListing>, StoreError> {
        (**self).product_listings(product_id).await
    }

    async fn variant_listings(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<VariantChannelListing>, StoreError> {
        (**self).variant_listings(variant_id).await
    }
}

#[async_trait::async_trait]
impl<S> ListingStore for Arc<S>
where
    S: ListingStore + ?Sized,
{
    async fn commit(&self, writes: Vec<ListingWrite>) -> Result<CommitSummary, StoreError> {
        (**self).commit(writes).await
    }
}
