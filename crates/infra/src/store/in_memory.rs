use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use storefront_catalog::{
    Channel, Product, ProductChannelListing, ProductVariant, VariantChannelListing,
};
use storefront_core::{ChannelId, Entity, ProductId, VariantId};

use super::{CatalogReader, CommitSummary, ListingStore, ListingWrite, StoreError};

#[derive(Debug, Clone, Default)]
struct CatalogState {
    channels: HashMap<ChannelId, Channel>,
    products: HashMap<ProductId, Product>,
    variants: HashMap<VariantId, ProductVariant>,
    product_listings: BTreeMap<(ProductId, ChannelId), ProductChannelListing>,
    variant_listings: BTreeMap<(VariantId, ChannelId), VariantChannelListing>,
}

impl CatalogState {
    fn require_channel(&self, id: ChannelId) -> Result<(), StoreError> {
        if self.channels.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(format!("channel {id}")))
        }
    }

    fn apply(&mut self, write: ListingWrite, summary: &mut CommitSummary) -> Result<(), StoreError> {
        match write {
            ListingWrite::UpsertProductListing(row) => {
                if !self.products.contains_key(&row.product_id) {
                    return Err(StoreError::MissingReference(format!(
                        "product {}",
                        row.product_id
                    )));
                }
                self.require_channel(row.channel_id)?;
                match self.product_listings.insert(row.key(), row) {
                    Some(_) => summary.updated += 1,
                    None => summary.inserted += 1,
                }
            }
            ListingWrite::DeleteProductListing {
                product_id,
                channel_id,
            } => {
                if self
                    .product_listings
                    .remove(&(product_id, channel_id))
                    .is_some()
                {
                    summary.deleted += 1;
                }
            }
            ListingWrite::UpsertVariantListing(row) => {
                if !self.variants.contains_key(&row.variant_id) {
                    return Err(StoreError::MissingReference(format!(
                        "variant {}",
                        row.variant_id
                    )));
                }
                self.require_channel(row.channel_id)?;
                match self.variant_listings.insert(row.key(), row) {
                    Some(_) => summary.updated += 1,
                    None => summary.inserted += 1,
                }
            }
        }
        Ok(())
    }
}

/// In-memory catalog for tests/dev.
///
/// A commit stages its writes on a copy of the state and swaps the copy in only
/// when every write succeeded, so a failed batch leaves nothing behind.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<CatalogState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_state<T>(&self, f: impl FnOnce(&mut CatalogState) -> T) -> Result<T, StoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        Ok(f(&mut state))
    }

    fn read_state<T>(&self, f: impl FnOnce(&CatalogState) -> T) -> Result<T, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(f(&state))
    }

    // Seeding. Channels and products are managed elsewhere; these exist for fixtures.

    pub fn insert_channel(&self, channel: Channel) -> Result<(), StoreError> {
        self.write_state(|s| {
            index(&mut s.channels, channel);
        })
    }

    pub fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        self.write_state(|s| {
            index(&mut s.products, product);
        })
    }

    pub fn insert_variant(&self, variant: ProductVariant) -> Result<(), StoreError> {
        self.write_state(|s| {
            index(&mut s.variants, variant);
        })
    }

    pub fn insert_product_listing(&self, row: ProductChannelListing) -> Result<(), StoreError> {
        self.write_state(|s| {
            s.product_listings.insert(row.key(), row);
        })
    }

    pub fn insert_variant_listing(&self, row: VariantChannelListing) -> Result<(), StoreError> {
        self.write_state(|s| {
            s.variant_listings.insert(row.key(), row);
        })
    }
}

fn index<E: Entity>(map: &mut HashMap<E::Id, E>, entity: E) {
    map.insert(entity.id().clone(), entity);
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory catalog lock poisoned".to_string())
}

#[async_trait::async_trait]
impl CatalogReader for InMemoryCatalogStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.read_state(|s| s.products.get(&id).cloned())
    }

    async fn get_variant(&self, id: VariantId) -> Result<Option<ProductVariant>, StoreError> {
        self.read_state(|s| s.variants.get(&id).cloned())
    }

    async fn get_channels(&self, ids: &[ChannelId]) -> Result<Vec<Channel>, StoreError> {
        self.read_state(|s| ids.iter().filter_map(|id| s.channels.get(id).cloned()).collect())
    }

    async fn product_channel_ids(
        &self,
        product_id: ProductId,
    ) -> Result<HashSet<ChannelId>, StoreError> {
        self.read_state(|s| {
            s.product_listings
                .keys()
                .filter(|(product, _)| *product == product_id)
                .map(|(_, channel)| *channel)
                .collect()
        })
    }

    async fn product_listings(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductChannelListing>, StoreError> {
        self.read_state(|s| {
            s.product_listings
                .values()
                .filter(|row| row.product_id == product_id)
                .cloned()
                .collect()
        })
    }

    async fn variant_listings(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<VariantChannelListing>, StoreError> {
        self.read_state(|s| {
            s.variant_listings
                .values()
                .filter(|row| row.variant_id == variant_id)
                .cloned()
                .collect()
        })
    }
}

#[async_trait::async_trait]
impl ListingStore for InMemoryCatalogStore {
    async fn commit(&self, writes: Vec<ListingWrite>) -> Result<CommitSummary, StoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;

        let mut staged = state.clone();
        let mut summary = CommitSummary::default();
        for write in writes {
            staged.apply(write, &mut summary)?;
        }

        *state = staged;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storefront_catalog::CurrencyCode;

    fn seeded() -> (InMemoryCatalogStore, Product, Channel) {
        let store = InMemoryCatalogStore::new();
        let product = Product::new(ProductId::new(), "Tee", None);
        let channel = Channel::new(
            ChannelId::new(),
            "Default",
            "default",
            CurrencyCode::new("USD").unwrap(),
        );
        store.insert_product(product.clone()).unwrap();
        store.insert_channel(channel.clone()).unwrap();
        (store, product, channel)
    }

    fn listing(product: &Product, channel: &Channel, is_published: bool) -> ProductChannelListing {
        ProductChannelListing {
            product_id: product.id,
            channel_id: channel.id,
            is_published,
            publication_date: None,
        }
    }

    #[tokio::test]
    async fn upsert_counts_inserts_then_updates() {
        let (store, product, channel) = seeded();

        let first = store
            .commit(vec![ListingWrite::UpsertProductListing(listing(&product, &channel, false))])
            .await
            .unwrap();
        let second = store
            .commit(vec![ListingWrite::UpsertProductListing(listing(&product, &channel, true))])
            .await
            .unwrap();

        assert_eq!(first.inserted, 1);
        assert_eq!(second.updated, 1);
        let rows = store.product_listings(product.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_published);
    }

    #[tokio::test]
    async fn deleting_an_absent_row_is_a_no_op() {
        let (store, product, channel) = seeded();

        let summary = store
            .commit(vec![ListingWrite::DeleteProductListing {
                product_id: product.id,
                channel_id: channel.id,
            }])
            .await
            .unwrap();

        assert_eq!(summary, CommitSummary::default());
    }

    #[tokio::test]
    async fn failing_write_discards_the_whole_batch() {
        let (store, product, channel) = seeded();
        let missing_variant = VariantId::new();

        let err = store
            .commit(vec![
                ListingWrite::UpsertProductListing(listing(&product, &channel, true)),
                ListingWrite::UpsertVariantListing(VariantChannelListing::priced_in(
                    missing_variant,
                    &channel,
                    Decimal::ONE,
                )),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::MissingReference(_)));
        assert!(store.product_listings(product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_channels_skips_unknown_keys() {
        let (store, _, channel) = seeded();
        let found = store
            .get_channels(&[channel.id, ChannelId::new()])
            .await
            .unwrap();
        assert_eq!(found, vec![channel]);
    }
}
