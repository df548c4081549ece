//! Listing update inputs, before and after the clean stage.
//!
//! Raw inputs carry opaque external channel ids exactly as the caller sent them.
//! Cleaned inputs pair each entry with its resolved [`Channel`] but keep the
//! external id, since every error reports identifiers in the caller's terms.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::ChannelId;

use crate::channel::Channel;

/// One channel to add a product to (or update the product's listing in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChannelListingAddInput {
    pub channel_id: String,
    pub is_published: bool,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
}

/// Request body of a product listing update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChannelListingUpdateInput {
    #[serde(default)]
    pub add_channels: Vec<ProductChannelListingAddInput>,
    #[serde(default)]
    pub remove_channels: Vec<String>,
}

impl ProductChannelListingUpdateInput {
    pub fn add_channel_ids(&self) -> Vec<&str> {
        self.add_channels
            .iter()
            .map(|entry| entry.channel_id.as_str())
            .collect()
    }
}

/// One (channel, price) entry of a variant listing update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantChannelListingAddInput {
    pub channel_id: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedProductListingAdd {
    /// External id as submitted.
    pub channel_id: String,
    pub channel: Channel,
    pub is_published: bool,
    pub publication_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedProductListingInput {
    pub add_channels: Vec<CleanedProductListingAdd>,
    /// Internal keys of the channels to unlist. Identifiers that did not resolve are
    /// already dropped here.
    pub remove_channels: Vec<ChannelId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedVariantListing {
    /// External id as submitted.
    pub channel_id: String,
    pub channel: Channel,
    pub price: Decimal,
}
