use tracing::{debug, info, instrument};

use storefront_catalog::rules::{check_product_input_duplicates, check_publishable};
use storefront_catalog::{
    CleanedProductListingAdd, CleanedProductListingInput, ListingViolation, Product,
    ProductChannelListing, ProductChannelListingUpdateInput, ValidationReport,
};
use storefront_core::ChannelId;

use super::{ChannelContext, ListingUpdateError, ProductListingsView};
use crate::resolver::NodeResolver;
use crate::store::{CatalogReader, ListingStore, ListingWrite, StoreError};

/// Adds, updates and removes the channel listings of one product.
pub struct ProductChannelListingUpdate<S> {
    store: S,
}

impl<S> ProductChannelListingUpdate<S>
where
    S: CatalogReader + ListingStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(
        skip(self, input),
        fields(
            add_count = input.add_channels.len(),
            remove_count = input.remove_channels.len()
        )
    )]
    pub async fn perform(
        &self,
        product_id: &str,
        input: ProductChannelListingUpdateInput,
    ) -> Result<ChannelContext<ProductListingsView>, ListingUpdateError> {
        let resolver = NodeResolver::new(&self.store);
        let Some(product) = resolver.product(product_id).await? else {
            return Err(ValidationReport::single(ListingViolation::ProductNotFound {
                id: product_id.to_string(),
            })
            .into());
        };

        let mut report = ValidationReport::new();
        let cleaned = self.clean(&input, &mut report).await?;
        Self::validate(&product, &cleaned, &mut report);

        let cleaned = report.into_result(cleaned).map_err(|report| {
            info!(violations = report.len(), "product listing update rejected");
            report
        })?;

        self.save(&product, cleaned).await?;

        let listings = self.store.product_listings(product.id).await?;
        Ok(ChannelContext::unscoped(ProductListingsView { product, listings }))
    }

    /// Duplicate checks, then identifier resolution.
    ///
    /// When a duplicate is found no identifier is resolved and an empty cleaned input
    /// is returned.
    async fn clean(
        &self,
        input: &ProductChannelListingUpdateInput,
        report: &mut ValidationReport,
    ) -> Result<CleanedProductListingInput, StoreError> {
        let duplicates = check_product_input_duplicates(input);
        if !duplicates.is_empty() {
            debug!(violations = duplicates.len(), "duplicate channel ids in input");
            report.merge(duplicates);
            return Ok(CleanedProductListingInput::default());
        }

        let resolver = NodeResolver::new(&self.store);
        let resolution = resolver.channels(input.add_channel_ids()).await?;
        report.push_if_any(resolution.unresolved.clone(), |channels| {
            ListingViolation::ChannelsNotFound { channels }
        });

        let add_channels = input
            .add_channels
            .iter()
            .filter_map(|entry| {
                let channel = resolution.get(&entry.channel_id)?;
                Some(CleanedProductListingAdd {
                    channel_id: entry.channel_id.clone(),
                    channel: channel.clone(),
                    is_published: entry.is_published,
                    publication_date: entry.publication_date,
                })
            })
            .collect();

        let remove_channels: Vec<ChannelId> = resolver.keys(&input.remove_channels);

        Ok(CleanedProductListingInput {
            add_channels,
            remove_channels,
        })
    }

    fn validate(product: &Product, cleaned: &CleanedProductListingInput, report: &mut ValidationReport) {
        report.merge(check_publishable(product, cleaned));
    }

    async fn save(&self, product: &Product, cleaned: CleanedProductListingInput) -> Result<(), StoreError> {
        let upserts = cleaned.add_channels.into_iter().map(|entry| {
            ListingWrite::UpsertProductListing(ProductChannelListing {
                product_id: product.id,
                channel_id: entry.channel.id,
                is_published: entry.is_published,
                publication_date: entry.publication_date,
            })
        });
        let deletes = cleaned
            .remove_channels
            .into_iter()
            .map(|channel_id| ListingWrite::DeleteProductListing {
                product_id: product.id,
                channel_id,
            });

        let summary = self.store.commit(upserts.chain(deletes).collect()).await?;
        info!(
            product_id = %product.id,
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "product channel listings saved"
        );
        Ok(())
    }
}
