use serde::{Deserialize, Serialize};

use storefront_core::{ChannelId, DomainError, DomainResult, Entity, ValueObject};

/// ISO 4217 style currency code (three uppercase ASCII letters, e.g. "USD").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "currency code must be three uppercase letters, got '{code}'"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for CurrencyCode {}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sales context (storefront, market) with its own currency.
///
/// Channels are read-only from the listing managers' point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub slug: String,
    pub currency_code: CurrencyCode,
}

impl Channel {
    pub fn new(
        id: ChannelId,
        name: impl Into<String>,
        slug: impl Into<String>,
        currency_code: CurrencyCode,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            currency_code,
        }
    }
}

impl Entity for Channel {
    type Id = ChannelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
