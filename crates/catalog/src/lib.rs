//! Catalog domain module: channels, products, variants and their per-channel listings.
//!
//! This crate contains the business rules for channel listings, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Identifier resolution and
//! persistence are composed around these rules by `storefront-infra`.

pub mod channel;
pub mod input;
pub mod listing;
pub mod product;
pub mod rules;
pub mod violation;

pub use channel::{Channel, CurrencyCode};
pub use input::{
    CleanedProductListingAdd, CleanedProductListingInput, CleanedVariantListing,
    ProductChannelListingAddInput, ProductChannelListingUpdateInput,
    VariantChannelListingAddInput,
};
pub use listing::{ProductChannelListing, VariantChannelListing};
pub use product::{Product, ProductVariant};
pub use violation::{ListingErrorCode, ListingField, ListingViolation, ValidationReport};
