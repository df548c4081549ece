//! Infrastructure layer: listing stores, identifier resolution and the listing managers.

pub mod listings;
pub mod resolver;
pub mod store;


pub use listings::{
    ChannelContext, ListingUpdateError, ProductChannelListingUpdate, ProductListingsView,
    VariantChannelListingUpdate, VariantListingsView, product_view, variant_view,
};
pub use resolver::{NodeResolver, Resolution};
pub use store::{
    CatalogReader, CommitSummary, InMemoryCatalogStore, ListingStore, ListingWrite,
    PostgresCatalogStore, StoreError,
};
