//! Listing validation failures.
//!
//! Every failure category is a variant of [`ListingViolation`] and carries the
//! offending external identifiers. A request's failures are accumulated into one
//! [`ValidationReport`] and returned together.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error code. Callers branch on this, never on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingErrorCode {
    DuplicatedInputItem,
    NotFound,
    ProductWithoutCategory,
    ProductNotAssignedToChannel,
    Invalid,
}

impl ListingErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingErrorCode::DuplicatedInputItem => "DUPLICATED_INPUT_ITEM",
            ListingErrorCode::NotFound => "NOT_FOUND",
            ListingErrorCode::ProductWithoutCategory => "PRODUCT_WITHOUT_CATEGORY",
            ListingErrorCode::ProductNotAssignedToChannel => "PRODUCT_NOT_ASSIGNED_TO_CHANNEL",
            ListingErrorCode::Invalid => "INVALID",
        }
    }
}

/// Input field an error is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListingField {
    Id,
    Input,
    AddChannels,
    RemoveChannels,
    /// `channel_id` of an add entry (resolution failures).
    ChannelId,
    /// `channelId` list of a variant update (duplicate detection).
    ChannelIdList,
    IsPublished,
    Price,
}

impl ListingField {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingField::Id => "id",
            ListingField::Input => "input",
            ListingField::AddChannels => "add_channels",
            ListingField::RemoveChannels => "remove_channels",
            ListingField::ChannelId => "channel_id",
            ListingField::ChannelIdList => "channelId",
            ListingField::IsPublished => "is_published",
            ListingField::Price => "price",
        }
    }
}

impl core::fmt::Display for ListingField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single listing validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingViolation {
    #[error("Couldn't resolve to a product: {id}")]
    ProductNotFound { id: String },

    #[error("Couldn't resolve to a product variant: {id}")]
    VariantNotFound { id: String },

    #[error("The same object cannot be in both lists for adding and removing items.")]
    DuplicatedAcrossAddAndRemove { channels: Vec<String> },

    #[error("Duplicated channel ID.")]
    DuplicatedAddChannels { channels: Vec<String> },

    #[error("Duplicated channel ID.")]
    DuplicatedRemoveChannels { channels: Vec<String> },

    #[error("Duplicated channel ID.")]
    DuplicatedChannelIds { channels: Vec<String> },

    #[error("Couldn't resolve to a channel.")]
    ChannelsNotFound { channels: Vec<String> },

    #[error("You must select a category to be able to publish.")]
    PublishedWithoutCategory { channels: Vec<String> },

    #[error("Product not available in channels.")]
    ProductNotAssignedToChannels { channels: Vec<String> },

    #[error("Product price cannot be lower than 0.")]
    NegativePrice { channels: Vec<String> },

    #[error("Value cannot have more than {max_decimal_places} decimal places.")]
    PriceTooPrecise {
        channels: Vec<String>,
        max_decimal_places: u32,
    },
}

impl ListingViolation {
    pub fn field(&self) -> ListingField {
        match self {
            ListingViolation::ProductNotFound { .. } | ListingViolation::VariantNotFound { .. } => {
                ListingField::Id
            }
            ListingViolation::DuplicatedAcrossAddAndRemove { .. } => ListingField::Input,
            ListingViolation::DuplicatedAddChannels { .. } => ListingField::AddChannels,
            ListingViolation::DuplicatedRemoveChannels { .. } => ListingField::RemoveChannels,
            ListingViolation::DuplicatedChannelIds { .. } => ListingField::ChannelIdList,
            ListingViolation::ChannelsNotFound { .. } => ListingField::ChannelId,
            ListingViolation::PublishedWithoutCategory { .. } => ListingField::IsPublished,
            ListingViolation::ProductNotAssignedToChannels { .. } => ListingField::Input,
            ListingViolation::NegativePrice { .. } | ListingViolation::PriceTooPrecise { .. } => {
                ListingField::Price
            }
        }
    }

    pub fn code(&self) -> ListingErrorCode {
        match self {
            ListingViolation::ProductNotFound { .. }
            | ListingViolation::VariantNotFound { .. }
            | ListingViolation::ChannelsNotFound { .. } => ListingErrorCode::NotFound,
            ListingViolation::DuplicatedAcrossAddAndRemove { .. }
            | ListingViolation::DuplicatedAddChannels { .. }
            | ListingViolation::DuplicatedRemoveChannels { .. }
            | ListingViolation::DuplicatedChannelIds { .. } => {
                ListingErrorCode::DuplicatedInputItem
            }
            ListingViolation::PublishedWithoutCategory { .. } => {
                ListingErrorCode::ProductWithoutCategory
            }
            ListingViolation::ProductNotAssignedToChannels { .. } => {
                ListingErrorCode::ProductNotAssignedToChannel
            }
            ListingViolation::NegativePrice { .. } | ListingViolation::PriceTooPrecise { .. } => {
                ListingErrorCode::Invalid
            }
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Offending external channel ids. Empty for target-not-found failures.
    pub fn channels(&self) -> &[String] {
        match self {
            ListingViolation::ProductNotFound { .. } | ListingViolation::VariantNotFound { .. } => {
                &[]
            }
            ListingViolation::DuplicatedAcrossAddAndRemove { channels }
            | ListingViolation::DuplicatedAddChannels { channels }
            | ListingViolation::DuplicatedRemoveChannels { channels }
            | ListingViolation::DuplicatedChannelIds { channels }
            | ListingViolation::ChannelsNotFound { channels }
            | ListingViolation::PublishedWithoutCategory { channels }
            | ListingViolation::ProductNotAssignedToChannels { channels }
            | ListingViolation::NegativePrice { channels }
            | ListingViolation::PriceTooPrecise { channels, .. } => channels,
        }
    }
}

/// All validation failures of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("listing update rejected with {} violation(s)", .violations.len())]
pub struct ValidationReport {
    violations: Vec<ListingViolation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(violation: ListingViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    pub fn push(&mut self, violation: ListingViolation) {
        self.violations.push(violation);
    }

    /// Push `make(channels)` only when `channels` is non-empty.
    pub fn push_if_any(
        &mut self,
        channels: Vec<String>,
        make: impl FnOnce(Vec<String>) -> ListingViolation,
    ) {
        if !channels.is_empty() {
            self.violations.push(make(channels));
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[ListingViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<ListingViolation> {
        self.violations
    }

    /// `Ok(value)` when nothing was reported, otherwise the report itself.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationReport> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}
