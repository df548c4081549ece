use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_catalog::{
    ListingErrorCode, ListingViolation, ProductChannelListing, VariantChannelListing,
    VariantChannelListingAddInput,
};
use storefront_core::GlobalId;
use storefront_infra::{ProductListingsView, VariantListingsView};

// -------------------------
// Request DTOs
// -------------------------

/// Product listing updates take `ProductChannelListingUpdateInput` as the body directly.
#[derive(Debug, Deserialize)]
pub struct VariantChannelListingUpdateRequest {
    #[serde(default)]
    pub input: Vec<VariantChannelListingAddInput>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChannelListingDto {
    pub channel_id: String,
    pub is_published: bool,
    pub publication_date: Option<NaiveDate>,
}

impl From<&ProductChannelListing> for ProductChannelListingDto {
    fn from(row: &ProductChannelListing) -> Self {
        Self {
            channel_id: GlobalId::encode(row.channel_id),
            is_published: row.is_published,
            publication_date: row.publication_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub channel_listings: Vec<ProductChannelListingDto>,
}

impl From<&ProductListingsView> for ProductDto {
    fn from(view: &ProductListingsView) -> Self {
        Self {
            id: GlobalId::encode(view.product.id),
            name: view.product.name.clone(),
            category_id: view.product.category.map(GlobalId::encode),
            channel_listings: view.listings.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoneyDto {
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantChannelListingDto {
    pub channel_id: String,
    pub price: MoneyDto,
}

impl From<&VariantChannelListing> for VariantChannelListingDto {
    fn from(row: &VariantChannelListing) -> Self {
        Self {
            channel_id: GlobalId::encode(row.channel_id),
            price: MoneyDto {
                amount: row.price_amount,
                currency: row.currency.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDto {
    pub id: String,
    pub product_id: String,
    pub sku: String,
    pub channel_listings: Vec<VariantChannelListingDto>,
}

impl From<&VariantListingsView> for VariantDto {
    fn from(view: &VariantListingsView) -> Self {
        Self {
            id: GlobalId::encode(view.variant.id),
            product_id: GlobalId::encode(view.variant.product_id),
            sku: view.variant.sku.clone(),
            channel_listings: view.listings.iter().map(Into::into).collect(),
        }
    }
}

/// One entry of the `errors` array.
#[derive(Debug, Serialize)]
pub struct ListingErrorDto {
    pub field: &'static str,
    pub code: ListingErrorCode,
    pub message: String,
    pub channels: Vec<String>,
}

impl From<&ListingViolation> for ListingErrorDto {
    fn from(violation: &ListingViolation) -> Self {
        Self {
            field: violation.field().as_str(),
            code: violation.code(),
            message: violation.message(),
            channels: violation.channels().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductUpdateResponse {
    pub product: ProductDto,
    pub errors: Vec<ListingErrorDto>,
}

#[derive(Debug, Serialize)]
pub struct VariantUpdateResponse {
    pub variant: VariantDto,
    pub errors: Vec<ListingErrorDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_dto_carries_field_code_and_channels() {
        let dto = ListingErrorDto::from(&ListingViolation::ProductNotAssignedToChannels {
            channels: vec!["C".into()],
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["field"], "input");
        assert_eq!(json["code"], "PRODUCT_NOT_ASSIGNED_TO_CHANNEL");
        assert_eq!(json["message"], "Product not available in channels.");
        assert_eq!(json["channels"], serde_json::json!(["C"]));
    }

    #[test]
    fn product_dto_exposes_only_global_ids() {
        use storefront_catalog::Product;
        use storefront_core::{CategoryId, ChannelId, ProductId};

        let category = CategoryId::new();
        let product = Product::new(ProductId::new(), "Tee", Some(category));
        let view = ProductListingsView {
            listings: vec![ProductChannelListing {
                product_id: product.id,
                channel_id: ChannelId::new(),
                is_published: true,
                publication_date: None,
            }],
            product,
        };

        let dto = ProductDto::from(&view);
        let category_id = dto.category_id.unwrap();
        assert_eq!(category_id, GlobalId::encode(category));
        assert_ne!(category_id, category.to_string());
        assert!(GlobalId::decode_as::<CategoryId>(&category_id).is_ok());
        assert!(GlobalId::decode_as::<ChannelId>(&dto.channel_listings[0].channel_id).is_ok());
    }

    #[test]
    fn variant_request_defaults_to_no_entries() {
        let req: VariantChannelListingUpdateRequest = serde_json::from_str("{}").unwrap();
        assert!(req.input.is_empty());
    }
}
