use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use storefront_catalog::{ProductChannelListingUpdateInput, VariantChannelListingAddInput};
use storefront_infra::{
    ChannelContext, InMemoryCatalogStore, ListingUpdateError, PostgresCatalogStore,
    ProductChannelListingUpdate, ProductListingsView, StoreError, VariantChannelListingUpdate,
    VariantListingsView, product_view, variant_view,
};

use crate::config::ApiConfig;

/// Store backend selected at startup.
pub enum AppServices {
    InMemory { store: Arc<InMemoryCatalogStore> },
    Postgres { store: Arc<PostgresCatalogStore> },
}

impl AppServices {
    pub fn in_memory(store: Arc<InMemoryCatalogStore>) -> Self {
        AppServices::InMemory { store }
    }

    pub async fn update_product_listings(
        &self,
        product_id: &str,
        input: ProductChannelListingUpdateInput,
    ) -> Result<ChannelContext<ProductListingsView>, ListingUpdateError> {
        match self {
            AppServices::InMemory { store } => {
                ProductChannelListingUpdate::new(store.clone())
                    .perform(product_id, input)
                    .await
            }
            AppServices::Postgres { store } => {
                ProductChannelListingUpdate::new(store.clone())
                    .perform(product_id, input)
                    .await
            }
        }
    }

    pub async fn update_variant_listings(
        &self,
        variant_id: &str,
        input: Vec<VariantChannelListingAddInput>,
    ) -> Result<ChannelContext<VariantListingsView>, ListingUpdateError> {
        match self {
            AppServices::InMemory { store } => {
                VariantChannelListingUpdate::new(store.clone())
                    .perform(variant_id, input)
                    .await
            }
            AppServices::Postgres { store } => {
                VariantChannelListingUpdate::new(store.clone())
                    .perform(variant_id, input)
                    .await
            }
        }
    }

    pub async fn product(&self, product_id: &str) -> Result<Option<ProductListingsView>, StoreError> {
        match self {
            AppServices::InMemory { store } => product_view(store.as_ref(), product_id).await,
            AppServices::Postgres { store } => product_view(store.as_ref(), product_id).await,
        }
    }

    pub async fn variant(&self, variant_id: &str) -> Result<Option<VariantListingsView>, StoreError> {
        match self {
            AppServices::InMemory { store } => variant_view(store.as_ref(), variant_id).await,
            AppServices::Postgres { store } => variant_view(store.as_ref(), variant_id).await,
        }
    }
}

pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StoreError> {
    match &config.database_url {
        Some(url) => build_postgres_services(url, config.db_max_connections).await,
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory catalog store");
            Ok(AppServices::in_memory(Arc::new(InMemoryCatalogStore::new())))
        }
    }
}

async fn build_postgres_services(url: &str, max_connections: u32) -> Result<AppServices, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(|e| StoreError::Backend(format!("failed to connect to Postgres: {e}")))?;

    let store = PostgresCatalogStore::new(pool);
    store.ensure_schema().await?;

    tracing::info!(max_connections, "using Postgres catalog store");
    Ok(AppServices::Postgres {
        store: Arc::new(store),
    })
}
