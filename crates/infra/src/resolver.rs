//! Global id → entity resolution.
//!
//! Two modes are offered: [`NodeResolver::channels`] reports every identifier that did
//! not resolve, [`NodeResolver::keys`] silently drops them.

use std::collections::HashMap;

use storefront_catalog::{Channel, Product, ProductVariant};
use storefront_core::{ChannelId, GlobalId, NodeKey, ProductId, VariantId};

use crate::store::{CatalogReader, StoreError};

/// Outcome of a strict batch resolution, keyed by the external id as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<T> {
    pub resolved: HashMap<String, T>,
    /// Identifiers that did not decode, had the wrong kind or matched nothing,
    /// in submission order.
    pub unresolved: Vec<String>,
}

impl<T> Resolution<T> {
    pub fn get(&self, raw: &str) -> Option<&T> {
        self.resolved.get(raw)
    }
}

pub struct NodeResolver<'a, R: ?Sized> {
    reader: &'a R,
}

impl<'a, R> NodeResolver<'a, R>
where
    R: CatalogReader + ?Sized,
{
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// `None` when the id is malformed, of another kind, or unknown.
    pub async fn product(&self, raw: &str) -> Result<Option<Product>, StoreError> {
        match GlobalId::decode_as::<ProductId>(raw) {
            Ok(id) => self.reader.get_product(id).await,
            Err(_) => Ok(None),
        }
    }

    pub async fn variant(&self, raw: &str) -> Result<Option<ProductVariant>, StoreError> {
        match GlobalId::decode_as::<VariantId>(raw) {
            Ok(id) => self.reader.get_variant(id).await,
            Err(_) => Ok(None),
        }
    }

    /// Resolve every identifier to a channel in one store round trip.
    pub async fn channels<'r>(
        &self,
        raw_ids: impl IntoIterator<Item = &'r str>,
    ) -> Result<Resolution<Channel>, StoreError> {
        let raw_ids: Vec<&str> = raw_ids.into_iter().collect();
        let decoded: Vec<Option<ChannelId>> = raw_ids
            .iter()
            .map(|raw| GlobalId::decode_as::<ChannelId>(raw).ok())
            .collect();

        let keys: Vec<ChannelId> = decoded.iter().flatten().copied().collect();
        let found: HashMap<ChannelId, Channel> = self
            .reader
            .get_channels(&keys)
            .await?
            .into_iter()
            .map(|channel| (channel.id, channel))
            .collect();

        let mut resolution = Resolution {
            resolved: HashMap::new(),
            unresolved: Vec::new(),
        };
        for (raw, id) in raw_ids.into_iter().zip(decoded) {
            match id.and_then(|id| found.get(&id)) {
                Some(channel) => {
                    resolution.resolved.insert(raw.to_string(), channel.clone());
                }
                None => resolution.unresolved.push(raw.to_string()),
            }
        }
        Ok(resolution)
    }

    /// Decode identifiers into internal keys of kind `K`, dropping any that fail.
    ///
    /// No store access: a key that decodes but matches no row is kept, and acting on
    /// it later is expected to be a no-op.
    pub fn keys<K: NodeKey>(&self, raw_ids: &[String]) -> Vec<K> {
        raw_ids
            .iter()
            .filter_map(|raw| GlobalId::decode_as::<K>(raw).ok())
            .collect()
    }
}
