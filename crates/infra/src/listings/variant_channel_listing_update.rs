use tracing::{debug, info, instrument};

use storefront_catalog::rules::{check_assigned_to_channels, check_prices, check_variant_input_duplicates};
use storefront_catalog::{
    CleanedVariantListing, ListingViolation, ProductVariant, ValidationReport,
    VariantChannelListing, VariantChannelListingAddInput,
};

use super::{ChannelContext, ListingUpdateError, VariantListingsView};
use crate::resolver::NodeResolver;
use crate::store::{CatalogReader, ListingStore, ListingWrite, StoreError};

/// Sets per-channel prices of one variant.
///
/// Prices can only be set in channels the parent product is listed on. The currency
/// of every row is taken from its channel.
pub struct VariantChannelListingUpdate<S> {
    store: S,
}

impl<S> VariantChannelListingUpdate<S>
where
    S: CatalogReader + ListingStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(entry_count = input.len()))]
    pub async fn perform(
        &self,
        variant_id: &str,
        input: Vec<VariantChannelListingAddInput>,
    ) -> Result<ChannelContext<VariantListingsView>, ListingUpdateError> {
        let Some(variant) = NodeResolver::new(&self.store).variant(variant_id).await? else {
            return Err(ValidationReport::single(ListingViolation::VariantNotFound {
                id: variant_id.to_string(),
            })
            .into());
        };

        let mut report = ValidationReport::new();
        let cleaned = self.clean(&input, &mut report).await?;
        self.validate(&variant, &cleaned, &mut report).await?;

        let cleaned = report.into_result(cleaned).map_err(|report| {
            info!(violations = report.len(), "variant listing update rejected");
            report
        })?;

        self.save(&variant, cleaned).await?;

        let listings = self.store.variant_listings(variant.id).await?;
        Ok(ChannelContext::unscoped(VariantListingsView { variant, listings }))
    }

    async fn clean(
        &self,
        input: &[VariantChannelListingAddInput],
        report: &mut ValidationReport,
    ) -> Result<Vec<CleanedVariantListing>, StoreError> {
        let duplicates = check_variant_input_duplicates(input);
        if !duplicates.is_empty() {
            debug!(violations = duplicates.len(), "duplicate channel ids in input");
            report.merge(duplicates);
            return Ok(Vec::new());
        }

        let resolution = NodeResolver::new(&self.store)
            .channels(input.iter().map(|entry| entry.channel_id.as_str()))
            .await?;
        report.push_if_any(resolution.unresolved.clone(), |channels| {
            ListingViolation::ChannelsNotFound { channels }
        });

        Ok(input
            .iter()
            .filter_map(|entry| {
                let channel = resolution.get(&entry.channel_id)?;
                Some(CleanedVariantListing {
                    channel_id: entry.channel_id.clone(),
                    channel: channel.clone(),
                    price: entry.price,
                })
            })
            .collect())
    }

    /// Assignment and price checks both run; one channel may fail both.
    async fn validate(
        &self,
        variant: &ProductVariant,
        cleaned: &[CleanedVariantListing],
        report: &mut ValidationReport,
    ) -> Result<(), StoreError> {
        // Read outside the reconcile transaction; a concurrent unlisting is not re-checked.
        let product_channels = self.store.product_channel_ids(variant.product_id).await?;
        report.merge(check_assigned_to_channels(cleaned, &product_channels));
        report.merge(check_prices(cleaned));
        Ok(())
    }

    async fn save(
        &self,
        variant: &ProductVariant,
        cleaned: Vec<CleanedVariantListing>,
    ) -> Result<(), StoreError> {
        let writes = cleaned
            .iter()
            .map(|entry| {
                ListingWrite::UpsertVariantListing(VariantChannelListing::priced_in(
                    variant.id,
                    &entry.channel,
                    entry.price,
                ))
            })
            .collect();

        let summary = self.store.commit(writes).await?;
        info!(
            variant_id = %variant.id,
            inserted = summary.inserted,
            updated = summary.updated,
            "variant channel listings saved"
        );
        Ok(())
    }
}
