//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; two values with the same attributes are
//! the same value. In the catalog, a currency code is a value object while a
//! channel (which owns one) is an entity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "modify" one, build a
/// new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct CurrencyCode(String);
///
/// impl ValueObject for CurrencyCode {}
///
/// assert_eq!(CurrencyCode("USD".into()), CurrencyCode("USD".into()));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
