//! Per-channel listing rows.
//!
//! Both row types are keyed by `(entity, channel)`; a store holds at most one row
//! per key.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{ChannelId, ProductId, VariantId};

use crate::channel::{Channel, CurrencyCode};

/// Visibility of a product in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductChannelListing {
    pub product_id: ProductId,
    pub channel_id: ChannelId,
    pub is_published: bool,
    pub publication_date: Option<NaiveDate>,
}

impl ProductChannelListing {
    pub fn key(&self) -> (ProductId, ChannelId) {
        (self.product_id, self.channel_id)
    }
}

/// Price of a variant in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantChannelListing {
    pub variant_id: VariantId,
    pub channel_id: ChannelId,
    pub price_amount: Decimal,
    pub currency: CurrencyCode,
}

impl VariantChannelListing {
    /// Build a price row for `channel`. The currency always comes from the channel.
    pub fn priced_in(variant_id: VariantId, channel: &Channel, price_amount: Decimal) -> Self {
        Self {
            variant_id,
            channel_id: channel.id,
            price_amount,
            currency: channel.currency_code.clone(),
        }
    }

    pub fn key(&self) -> (VariantId, ChannelId) {
        (self.variant_id, self.channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_listing_takes_currency_from_channel() {
        let channel = Channel::new(
            ChannelId::new(),
            "Poland",
            "pl",
            CurrencyCode::new("PLN").unwrap(),
        );
        let variant_id = VariantId::new();

        let row = VariantChannelListing::priced_in(variant_id, &channel, Decimal::new(1999, 2));

        assert_eq!(row.key(), (variant_id, channel.id));
        assert_eq!(row.currency.as_str(), "PLN");
        assert_eq!(row.price_amount.to_string(), "19.99");
    }
}
