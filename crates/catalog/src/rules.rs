//! Pure listing rules.
//!
//! Each `check_*` function inspects already-loaded data and returns the violations
//! it found (possibly none). The infra layer decides when each check runs.

use std::collections::HashSet;

use rust_decimal::Decimal;

use storefront_core::ChannelId;

use crate::input::{
    CleanedProductListingInput, CleanedVariantListing, ProductChannelListingUpdateInput,
    VariantChannelListingAddInput,
};
use crate::product::Product;
use crate::violation::{ListingViolation, ValidationReport};

/// Values that occur more than once, each reported once, in first-occurrence order.
pub fn duplicated_values<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            duplicates.push(id.to_string());
        }
    }
    duplicates
}

/// Values present in both lists, deduplicated, in `left` order.
pub fn duplicated_across<'a>(
    left: impl IntoIterator<Item = &'a str>,
    right: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let right: HashSet<&str> = right.into_iter().collect();
    let mut reported = HashSet::new();
    left.into_iter()
        .filter(|id| right.contains(id) && reported.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Decimal places a stored price keeps.
pub const MAX_PRICE_DECIMAL_PLACES: u32 = 3;

/// Structural duplicate checks of a product listing update.
///
/// A non-empty result means identifier resolution must not run for this request.
pub fn check_product_input_duplicates(input: &ProductChannelListingUpdateInput) -> ValidationReport {
    let add_ids = input.add_channel_ids();
    let remove_ids = || input.remove_channels.iter().map(String::as_str);

    let mut report = ValidationReport::new();
    report.push_if_any(
        duplicated_across(add_ids.iter().copied(), remove_ids()),
        |channels| ListingViolation::DuplicatedAcrossAddAndRemove { channels },
    );
    report.push_if_any(duplicated_values(add_ids.iter().copied()), |channels| {
        ListingViolation::DuplicatedAddChannels { channels }
    });
    report.push_if_any(duplicated_values(remove_ids()), |channels| {
        ListingViolation::DuplicatedRemoveChannels { channels }
    });
    report
}

/// Structural duplicate check of a variant listing update.
pub fn check_variant_input_duplicates(entries: &[VariantChannelListingAddInput]) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.push_if_any(
        duplicated_values(entries.iter().map(|entry| entry.channel_id.as_str())),
        |channels| ListingViolation::DuplicatedChannelIds { channels },
    );
    report
}

/// A product without a category may not be published in any channel.
///
/// All offending channels are reported in one violation.
pub fn check_publishable(product: &Product, cleaned: &CleanedProductListingInput) -> ValidationReport {
    let mut report = ValidationReport::new();
    if product.can_be_published() {
        return report;
    }
    let published = cleaned
        .add_channels
        .iter()
        .filter(|entry| entry.is_published)
        .map(|entry| entry.channel_id.clone())
        .collect();
    report.push_if_any(published, |channels| {
        ListingViolation::PublishedWithoutCategory { channels }
    });
    report
}

/// Variant prices may only be set in channels the parent product is listed on.
pub fn check_assigned_to_channels(
    cleaned: &[CleanedVariantListing],
    product_channels: &HashSet<ChannelId>,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let unassigned = cleaned
        .iter()
        .filter(|entry| !product_channels.contains(&entry.channel.id))
        .map(|entry| entry.channel_id.clone())
        .collect();
    report.push_if_any(unassigned, |channels| {
        ListingViolation::ProductNotAssignedToChannels { channels }
    });
    report
}

/// Prices must not be negative and must fit the stored precision. Runs regardless of
/// the assignment check.
pub fn check_prices(cleaned: &[CleanedVariantListing]) -> ValidationReport {
    let mut report = ValidationReport::new();
    let negative = cleaned
        .iter()
        .filter(|entry| entry.price < Decimal::ZERO)
        .map(|entry| entry.channel_id.clone())
        .collect();
    report.push_if_any(negative, |channels| ListingViolation::NegativePrice { channels });

    // Trailing zeros do not count: 1.5000 is a valid price.
    let too_precise = cleaned
        .iter()
        .filter(|entry| entry.price.normalize().scale() > MAX_PRICE_DECIMAL_PLACES)
        .map(|entry| entry.channel_id.clone())
        .collect();
    report.push_if_any(too_precise, |channels| ListingViolation::PriceTooPrecise {
        channels,
        max_decimal_places: MAX_PRICE_DECIMAL_PLACES,
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use storefront_core::{CategoryId, ProductId};

    use crate::channel::{Channel, CurrencyCode};
    use crate::input::{CleanedProductListingAdd, ProductChannelListingAddInput};

    fn channel(slug: &str) -> Channel {
        Channel::new(ChannelId::new(), slug, slug, CurrencyCode::new("USD").unwrap())
    }

    fn add(id: &str, is_published: bool) -> ProductChannelListingAddInput {
        ProductChannelListingAddInput {
            channel_id: id.to_string(),
            is_published,
            publication_date: None,
        }
    }

    fn priced(id: &str, channel: &Channel, price: i64) -> CleanedVariantListing {
        CleanedVariantListing {
            channel_id: id.to_string(),
            channel: channel.clone(),
            price: Decimal::from(price),
        }
    }

    #[test]
    fn duplicated_values_reports_each_duplicate_once() {
        let dups = duplicated_values(["a", "b", "a", "c", "a", "b"]);
        assert_eq!(dups, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn same_channel_in_add_and_remove_is_one_violation() {
        let input = ProductChannelListingUpdateInput {
            add_channels: vec![add("A", true)],
            remove_channels: vec!["A".into()],
        };
        let report = check_product_input_duplicates(&input);
        assert_eq!(
            report.into_violations(),
            vec![ListingViolation::DuplicatedAcrossAddAndRemove {
                channels: vec!["A".into()]
            }]
        );
    }

    #[test]
    fn repeated_add_channel_is_reported_once() {
        let input = ProductChannelListingUpdateInput {
            add_channels: vec![add("A", true), add("A", false)],
            remove_channels: vec![],
        };
        let report = check_product_input_duplicates(&input);
        assert_eq!(
            report.into_violations(),
            vec![ListingViolation::DuplicatedAddChannels {
                channels: vec!["A".into()]
            }]
        );
    }

    #[test]
    fn repeated_remove_channel_is_reported() {
        let input = ProductChannelListingUpdateInput {
            add_channels: vec![],
            remove_channels: vec!["R".into(), "R".into()],
        };
        let report = check_product_input_duplicates(&input);
        assert_eq!(
            report.into_violations(),
            vec![ListingViolation::DuplicatedRemoveChannels {
                channels: vec!["R".into()]
            }]
        );
    }

    #[test]
    fn publish_without_category_collects_all_published_channels() {
        let product = Product::new(ProductId::new(), "Tee", None);
        let (a, b, c) = (channel("a"), channel("b"), channel("c"));
        let cleaned = CleanedProductListingInput {
            add_channels: vec![
                CleanedProductListingAdd {
                    channel_id: "A".into(),
                    channel: a,
                    is_published: true,
                    publication_date: None,
                },
                CleanedProductListingAdd {
                    channel_id: "B".into(),
                    channel: b,
                    is_published: false,
                    publication_date: None,
                },
                CleanedProductListingAdd {
                    channel_id: "C".into(),
                    channel: c,
                    is_published: true,
                    publication_date: None,
                },
            ],
            remove_channels: vec![],
        };

        let report = check_publishable(&product, &cleaned);
        assert_eq!(
            report.into_violations(),
            vec![ListingViolation::PublishedWithoutCategory {
                channels: vec!["A".into(), "C".into()]
            }]
        );

        let categorized = Product::new(product.id, "Tee", Some(CategoryId::new()));
        assert!(check_publishable(&categorized, &cleaned).is_empty());
    }

    #[test]
    fn assignment_and_price_checks_can_name_the_same_channel() {
        let (a, c) = (channel("a"), channel("c"));
        let listed: HashSet<ChannelId> = [a.id].into_iter().collect();
        let cleaned = vec![priced("A", &a, 10), priced("C", &c, -5)];

        let assignment = check_assigned_to_channels(&cleaned, &listed);
        let prices = check_prices(&cleaned);

        assert_eq!(assignment.violations()[0].channels().to_vec(), vec!["C".to_string()]);
        assert_eq!(prices.violations()[0].channels().to_vec(), vec!["C".to_string()]);
    }

    #[test]
    fn zero_price_is_valid() {
        let a = channel("a");
        assert!(check_prices(&[priced("A", &a, 0)]).is_empty());
    }

    #[test]
    fn prices_beyond_stored_precision_are_rejected() {
        let a = channel("a");
        let entry = |id: &str, price: Decimal| CleanedVariantListing {
            channel_id: id.to_string(),
            channel: a.clone(),
            price,
        };
        let cleaned = vec![
            entry("A", Decimal::new(1234, 3)),
            entry("B", Decimal::new(12345, 4)),
            entry("C", Decimal::new(15000, 4)),
            entry("D", Decimal::new(-12345, 4)),
        ];

        let violations = check_prices(&cleaned).into_violations();
        assert_eq!(
            violations,
            vec![
                ListingViolation::NegativePrice {
                    channels: vec!["D".into()]
                },
                ListingViolation::PriceTooPrecise {
                    channels: vec!["B".into(), "D".into()],
                    max_decimal_places: 3,
                },
            ]
        );
    }

    proptest! {
        #[test]
        fn duplicates_are_exactly_the_repeated_values(ids in prop::collection::vec("[a-d]", 0..12)) {
            let dups = duplicated_values(ids.iter().map(String::as_str));
            for id in &ids {
                let count = ids.iter().filter(|x| *x == id).count();
                prop_assert_eq!(dups.contains(id), count > 1);
            }
            let unique: HashSet<&String> = dups.iter().collect();
            prop_assert_eq!(unique.len(), dups.len());
        }

        #[test]
        fn across_is_the_intersection(
            left in prop::collection::vec("[a-e]", 0..8),
            right in prop::collection::vec("[a-e]", 0..8),
        ) {
            let both = duplicated_across(
                left.iter().map(String::as_str),
                right.iter().map(String::as_str),
            );
            for id in left.iter().chain(right.iter()) {
                prop_assert_eq!(both.contains(id), left.contains(id) && right.contains(id));
            }
        }

        #[test]
        fn distinct_inputs_produce_no_structural_violations(n in 0usize..6, m in 0usize..6) {
            let input = ProductChannelListingUpdateInput {
                add_channels: (0..n).map(|i| add(&format!("add-{i}"), i % 2 == 0)).collect(),
                remove_channels: (0..m).map(|i| format!("rm-{i}")).collect(),
            };
            prop_assert!(check_product_input_duplicates(&input).is_empty());
        }
    }
}
