//! Postgres-backed catalog store.
//!
//! Schema lives in `migrations/`. Every [`ListingStore::commit`] runs in one
//! transaction; upserts read the keyed row with `FOR UPDATE` and then insert or
//! update it, deletes remove the row if present.
//!
//! `FOR UPDATE` cannot lock a row that does not exist yet, so the insert branch uses
//! `ON CONFLICT DO NOTHING`. When a concurrent transaction committed the same key
//! first, the insert affects no row and the write falls back to `UPDATE`; the last
//! committed upsert wins.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (foreign key violation) | `23503` | `MissingReference` |
//! | Database (other) | Any other | `Backend` |
//! | ColumnDecode / Decode | N/A | `Decode` |
//! | PoolClosed / other | N/A | `Backend` |

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use storefront_catalog::{
    Channel, CurrencyCode, Product, ProductChannelListing, ProductVariant, VariantChannelListing,
};
use storefront_core::{CategoryId, ChannelId, ProductId, VariantId};

use super::{CatalogReader, CommitSummary, ListingStore, ListingWrite, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_channel_listings.sql");
const SCHEMA_LOCK_KEY: i64 = 0x5354_4f52_4546_524e;

#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the catalog tables if they do not exist yet.
    ///
    /// Holds a transaction-scoped advisory lock so that concurrent callers do not
    /// race on `CREATE TABLE IF NOT EXISTS`.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        sqlx::raw_sql(SCHEMA)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }
}

// SQLx row types

#[derive(Debug)]
struct ChannelRow {
    id: Uuid,
    name: String,
    slug: String,
    currency_code: String,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ChannelRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ChannelRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            currency_code: row.try_get("currency_code")?,
        })
    }
}

impl TryFrom<ChannelRow> for Channel {
    type Error = StoreError;

    fn try_from(row: ChannelRow) -> Result<Self, Self::Error> {
        let currency = CurrencyCode::new(row.currency_code)
            .map_err(|e| StoreError::Decode(format!("channel {}: {e}", row.id)))?;
        Ok(Channel::new(ChannelId::from_uuid(row.id), row.name, row.slug, currency))
    }
}

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    name: String,
    category_id: Option<Uuid>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category_id: row.try_get("category_id")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::new(
            ProductId::from_uuid(row.id),
            row.name,
            row.category_id.map(CategoryId::from_uuid),
        )
    }
}

#[derive(Debug)]
struct VariantRow {
    id: Uuid,
    product_id: Uuid,
    sku: String,
}

impl<'r> sqlx::FromRow<'r, PgRow> for VariantRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(VariantRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            sku: row.try_get("sku")?,
        })
    }
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        ProductVariant::new(
            VariantId::from_uuid(row.id),
            ProductId::from_uuid(row.product_id),
            row.sku,
        )
    }
}

#[derive(Debug)]
struct ProductListingRow {
    product_id: Uuid,
    channel_id: Uuid,
    is_published: bool,
    publication_date: Option<NaiveDate>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ProductListingRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductListingRow {
            product_id: row.try_get("product_id")?,
            channel_id: row.try_get("channel_id")?,
            is_published: row.try_get("is_published")?,
            publication_date: row.try_get("publication_date")?,
        })
    }
}

impl From<ProductListingRow> for ProductChannelListing {
    fn from(row: ProductListingRow) -> Self {
        ProductChannelListing {
            product_id: ProductId::from_uuid(row.product_id),
            channel_id: ChannelId::from_uuid(row.channel_id),
            is_published: row.is_published,
            publication_date: row.publication_date,
        }
    }
}

#[derive(Debug)]
struct VariantListingRow {
    variant_id: Uuid,
    channel_id: Uuid,
    price_amount: Decimal,
    currency: String,
}

impl<'r> sqlx::FromRow<'r, PgRow> for VariantListingRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(VariantListingRow {
            variant_id: row.try_get("variant_id")?,
            channel_id: row.try_get("channel_id")?,
            price_amount: row.try_get("price_amount")?,
            currency: row.try_get("currency")?,
        })
    }
}

impl TryFrom<VariantListingRow> for VariantChannelListing {
    type Error = StoreError;

    fn try_from(row: VariantListingRow) -> Result<Self, Self::Error> {
        let currency = CurrencyCode::new(row.currency).map_err(|e| {
            StoreError::Decode(format!(
                "variant listing ({}, {}): {e}",
                row.variant_id, row.channel_id
            ))
        })?;
        Ok(VariantChannelListing {
            variant_id: VariantId::from_uuid(row.variant_id),
            channel_id: ChannelId::from_uuid(row.channel_id),
            price_amount: row.price_amount,
            currency,
        })
    }
}

#[async_trait::async_trait]
impl CatalogReader for PostgresCatalogStore {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, category_id FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        Ok(row.map(Product::from))
    }

    #[instrument(skip(self), fields(variant_id = %id), err)]
    async fn get_variant(&self, id: VariantId) -> Result<Option<ProductVariant>, StoreError> {
        let row = sqlx::query_as::<_, VariantRow>(
            "SELECT id, product_id, sku FROM product_variants WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_variant", e))?;

        Ok(row.map(ProductVariant::from))
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn get_channels(&self, ids: &[ChannelId]) -> Result<Vec<Channel>, StoreError> {
        let keys: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, ChannelRow>(
            "SELECT id, name, slug, currency_code FROM channels WHERE id = ANY($1)",
        )
        .bind(&keys)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_channels", e))?;

        rows.into_iter().map(Channel::try_from).collect()
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn product_channel_ids(
        &self,
        product_id: ProductId,
    ) -> Result<HashSet<ChannelId>, StoreError> {
        let keys: Vec<Uuid> = sqlx::query_scalar(
            "SELECT channel_id FROM product_channel_listings WHERE product_id = $1",
        )
        .bind(product_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_channel_ids", e))?;

        Ok(keys.into_iter().map(ChannelId::from_uuid).collect())
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn product_listings(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductChannelListing>, StoreError> {
        let rows = sqlx::query_as::<_, ProductListingRow>(
            r#"
            SELECT product_id, channel_id, is_published, publication_date
            FROM product_channel_listings
            WHERE product_id = $1
            ORDER BY channel_id ASC
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_listings", e))?;

        Ok(rows.into_iter().map(ProductChannelListing::from).collect())
    }

    #[instrument(skip(self), fields(variant_id = %variant_id), err)]
    async fn variant_listings(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<VariantChannelListing>, StoreError> {
        let rows = sqlx::query_as::<_, VariantListingRow>(
            r#"
            SELECT variant_id, channel_id, price_amount, currency
            FROM variant_channel_listings
            WHERE variant_id = $1
            ORDER BY channel_id ASC
            "#,
        )
        .bind(variant_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("variant_listings", e))?;

        rows.into_iter().map(VariantChannelListing::try_from).collect()
    }
}

#[async_trait::async_trait]
impl ListingStore for PostgresCatalogStore {
    /// Dropping the transaction on an early `?` rolls it back.
    #[instrument(skip(self, writes), fields(write_count = writes.len()), err)]
    async fn commit(&self, writes: Vec<ListingWrite>) -> Result<CommitSummary, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let mut summary = CommitSummary::default();
        for write in writes {
            match write {
                ListingWrite::UpsertProductListing(row) => {
                    if upsert_product_listing(&mut tx, &row).await? {
                        summary.inserted += 1;
                    } else {
                        summary.updated += 1;
                    }
                }
                ListingWrite::DeleteProductListing {
                    product_id,
                    channel_id,
                } => {
                    let result = sqlx::query(
                        "DELETE FROM product_channel_listings WHERE product_id = $1 AND channel_id = $2",
                    )
                    .bind(product_id.as_uuid())
                    .bind(channel_id.as_uuid())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_product_listing", e))?;
                    summary.deleted += result.rows_affected() as usize;
                }
                ListingWrite::UpsertVariantListing(row) => {
                    if upsert_variant_listing(&mut tx, &row).await? {
                        summary.inserted += 1;
                    } else {
                        summary.updated += 1;
                    }
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(summary)
    }
}

/// Returns `true` when a new row was inserted.
async fn upsert_product_listing(
    tx: &mut Transaction<'_, Postgres>,
    row: &ProductChannelListing,
) -> Result<bool, StoreError> {
    const UPDATE: &str = r#"
        UPDATE product_channel_listings
        SET is_published = $3, publication_date = $4
        WHERE product_id = $1 AND channel_id = $2
        "#;
    const INSERT: &str = r#"
        INSERT INTO product_channel_listings (product_id, channel_id, is_published, publication_date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (product_id, channel_id) DO NOTHING
        "#;

    let existing: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT channel_id FROM product_channel_listings
        WHERE product_id = $1 AND channel_id = $2
        FOR UPDATE
        "#,
    )
    .bind(row.product_id.as_uuid())
    .bind(row.channel_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_product_listing", e))?;

    let bind = |sql: &'static str| {
        sqlx::query(sql)
            .bind(*row.product_id.as_uuid())
            .bind(*row.channel_id.as_uuid())
            .bind(row.is_published)
            .bind(row.publication_date)
    };

    if existing.is_none() {
        let inserted = bind(INSERT)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_product_listing", e))?;
        if inserted.rows_affected() == 1 {
            return Ok(true);
        }
    }

    bind(UPDATE)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("update_product_listing", e))?;
    Ok(false)
}

/// Returns `true` when a new row was inserted.
async fn upsert_variant_listing(
    tx: &mut Transaction<'_, Postgres>,
    row: &VariantChannelListing,
) -> Result<bool, StoreError> {
    const UPDATE: &str = r#"
        UPDATE variant_channel_listings
        SET price_amount = $3, currency = $4
        WHERE variant_id = $1 AND channel_id = $2
        "#;
    const INSERT: &str = r#"
        INSERT INTO variant_channel_listings (variant_id, channel_id, price_amount, currency)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (variant_id, channel_id) DO NOTHING
        "#;

    let existing: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT channel_id FROM variant_channel_listings
        WHERE variant_id = $1 AND channel_id = $2
        FOR UPDATE
        "#,
    )
    .bind(row.variant_id.as_uuid())
    .bind(row.channel_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_variant_listing", e))?;

    let bind = |sql: &'static str| {
        sqlx::query(sql)
            .bind(*row.variant_id.as_uuid())
            .bind(*row.channel_id.as_uuid())
            .bind(row.price_amount)
            .bind(row.currency.as_str().to_string())
    };

    if existing.is_none() {
        let inserted = bind(INSERT)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_variant_listing", e))?;
        if inserted.rows_affected() == 1 {
            return Ok(true);
        }
    }

    bind(UPDATE)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("update_variant_listing", e))?;
    Ok(false)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Decode(format!("{}: {}", operation, err))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use sqlx::postgres::PgPoolOptions;

    /// Tests in this module need a live database and return early without one.
    async fn connect() -> Option<(PgPool, PostgresCatalogStore)> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres store test");
            return None;
        };
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .unwrap();
        let store = PostgresCatalogStore::new(pool.clone());
        store.ensure_schema().await.unwrap();
        Some((pool, store))
    }

    struct Seeded {
        channel: Channel,
        product: ProductId,
        variant: VariantId,
    }

    async fn seed(pool: &PgPool) -> Seeded {
        let channel = Channel::new(
            ChannelId::new(),
            "Poland",
            format!("pl-{}", Uuid::now_v7()),
            CurrencyCode::new("PLN").unwrap(),
        );
        sqlx::query("INSERT INTO channels (id, name, slug, currency_code) VALUES ($1, $2, $3, $4)")
            .bind(*channel.id.as_uuid())
            .bind(channel.name.clone())
            .bind(channel.slug.clone())
            .bind(channel.currency_code.as_str().to_string())
            .execute(pool)
            .await
            .unwrap();

        let product = ProductId::new();
        sqlx::query("INSERT INTO products (id, name) VALUES ($1, 'Tee')")
            .bind(*product.as_uuid())
            .execute(pool)
            .await
            .unwrap();

        let variant = VariantId::new();
        sqlx::query("INSERT INTO product_variants (id, product_id, sku) VALUES ($1, $2, $3)")
            .bind(*variant.as_uuid())
            .bind(*product.as_uuid())
            .bind(format!("TEE-{}", Uuid::now_v7()))
            .execute(pool)
            .await
            .unwrap();

        Seeded {
            channel,
            product,
            variant,
        }
    }

    fn product_listing(seeded: &Seeded, is_published: bool) -> ProductChannelListing {
        ProductChannelListing {
            product_id: seeded.product,
            channel_id: seeded.channel.id,
            is_published,
            publication_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        }
    }

    #[test]
    fn closed_pool_maps_to_backend_error() {
        let err = map_sqlx_error("get_product", sqlx::Error::PoolClosed);
        assert_eq!(
            err,
            StoreError::Backend("connection pool closed in get_product".to_string())
        );
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates_and_reads_back() {
        let Some((pool, store)) = connect().await else {
            return;
        };
        let seeded = seed(&pool).await;

        let first = store
            .commit(vec![
                ListingWrite::UpsertProductListing(product_listing(&seeded, false)),
                ListingWrite::UpsertVariantListing(VariantChannelListing::priced_in(
                    seeded.variant,
                    &seeded.channel,
                    Decimal::new(1050, 2),
                )),
            ])
            .await
            .unwrap();
        assert_eq!((first.inserted, first.updated), (2, 0));

        let second = store
            .commit(vec![
                ListingWrite::UpsertProductListing(product_listing(&seeded, true)),
                ListingWrite::UpsertVariantListing(VariantChannelListing::priced_in(
                    seeded.variant,
                    &seeded.channel,
                    Decimal::new(999, 2),
                )),
            ])
            .await
            .unwrap();
        assert_eq!((second.inserted, second.updated), (0, 2));

        let listings = store.product_listings(seeded.product).await.unwrap();
        assert_eq!(listings, vec![product_listing(&seeded, true)]);

        let prices = store.variant_listings(seeded.variant).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].price_amount, Decimal::new(999, 2));
        assert_eq!(prices[0].currency.as_str(), "PLN");

        let channels = store.get_channels(&[seeded.channel.id, ChannelId::new()]).await.unwrap();
        assert_eq!(channels, vec![seeded.channel.clone()]);
    }

    #[tokio::test]
    async fn deleting_an_absent_listing_is_a_no_op() {
        let Some((pool, store)) = connect().await else {
            return;
        };
        let seeded = seed(&pool).await;
        let delete = || ListingWrite::DeleteProductListing {
            product_id: seeded.product,
            channel_id: seeded.channel.id,
        };

        let summary = store.commit(vec![delete()]).await.unwrap();
        assert_eq!(summary, CommitSummary::default());

        store
            .commit(vec![ListingWrite::UpsertProductListing(product_listing(&seeded, true))])
            .await
            .unwrap();
        let summary = store.commit(vec![delete()]).await.unwrap();
        assert_eq!(summary.deleted, 1);
        assert!(store.product_channel_ids(seeded.product).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_write_rolls_back_the_whole_batch() {
        let Some((pool, store)) = connect().await else {
            return;
        };
        let seeded = seed(&pool).await;

        let err = store
            .commit(vec![
                ListingWrite::UpsertProductListing(product_listing(&seeded, true)),
                ListingWrite::UpsertVariantListing(VariantChannelListing::priced_in(
                    VariantId::new(),
                    &seeded.channel,
                    Decimal::ONE,
                )),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::MissingReference(_)), "got {err:?}");
        assert!(store.product_listings(seeded.product).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_insert_of_the_same_key_is_overwritten_by_the_later_commit() {
        let Some((pool, store)) = connect().await else {
            return;
        };
        let seeded = seed(&pool).await;

        let mut other = pool.begin().await.unwrap();
        sqlx::query(
            "INSERT INTO product_channel_listings (product_id, channel_id, is_published) VALUES ($1, $2, FALSE)",
        )
        .bind(*seeded.product.as_uuid())
        .bind(*seeded.channel.id.as_uuid())
        .execute(&mut *other)
        .await
        .unwrap();

        let pending = tokio::spawn({
            let store = store.clone();
            let row = product_listing(&seeded, true);
            async move { store.commit(vec![ListingWrite::UpsertProductListing(row)]).await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        other.commit().await.unwrap();

        let summary = pending.await.unwrap().unwrap();
        assert_eq!((summary.inserted, summary.updated), (0, 1));
        assert_eq!(
            store.product_listings(seeded.product).await.unwrap(),
            vec![product_listing(&seeded, true)]
        );
    }

    #[tokio::test]
    async fn invalid_stored_currency_is_a_decode_error() {
        let Some((pool, store)) = connect().await else {
            return;
        };
        let id = ChannelId::new();
        sqlx::query("INSERT INTO channels (id, name, slug, currency_code) VALUES ($1, 'Bad', $2, 'us1')")
            .bind(*id.as_uuid())
            .bind(format!("bad-{}", Uuid::now_v7()))
            .execute(&pool)
            .await
            .unwrap();

        let err = store.get_channels(&[id]).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)), "got {err:?}");
    }
}
