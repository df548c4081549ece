//! Opaque external identifiers.
//!
//! External callers never see raw storage keys. Every node is addressed by a
//! global id: URL-safe base64 (no padding) of `"<NodeKind>:<uuid>"`.
//! Decoding validates both the encoding and the expected node kind.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::id::{CategoryId, ChannelId, ProductId, VariantId};

/// Kind of node a global id points to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Category,
    Channel,
    Product,
    ProductVariant,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Category => "Category",
            NodeKind::Channel => "Channel",
            NodeKind::Product => "Product",
            NodeKind::ProductVariant => "ProductVariant",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Category" => Some(NodeKind::Category),
            "Channel" => Some(NodeKind::Channel),
            "Product" => Some(NodeKind::Product),
            "ProductVariant" => Some(NodeKind::ProductVariant),
            _ => None,
        }
    }
}

impl core::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal key type that can be addressed through a global id.
pub trait NodeKey: Copy + From<Uuid> + Into<Uuid> {
    const KIND: NodeKind;
}

impl NodeKey for CategoryId {
    const KIND: NodeKind = NodeKind::Category;
}

impl NodeKey for ChannelId {
    const KIND: NodeKind = NodeKind::Channel;
}

impl NodeKey for ProductId {
    const KIND: NodeKind = NodeKind::Product;
}

impl NodeKey for VariantId {
    const KIND: NodeKind = NodeKind::ProductVariant;
}

/// A decoded global id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GlobalId {
    pub kind: NodeKind,
    pub uuid: Uuid,
}

impl GlobalId {
    pub fn new(kind: NodeKind, uuid: Uuid) -> Self {
        Self { kind, uuid }
    }

    /// Encode an internal key into its opaque external form.
    pub fn encode<K: NodeKey>(key: K) -> String {
        Self::new(K::KIND, key.into()).to_string()
    }

    /// Decode any global id, without checking its kind.
    pub fn decode(raw: &str) -> DomainResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|_| DomainError::invalid_id(format!("'{raw}' is not a valid global id")))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| DomainError::invalid_id(format!("'{raw}' is not a valid global id")))?;

        let (kind, uuid) = text
            .split_once(':')
            .ok_or_else(|| DomainError::invalid_id(format!("'{raw}' has no node kind")))?;
        let kind = NodeKind::parse(kind)
            .ok_or_else(|| DomainError::invalid_id(format!("unknown node kind '{kind}'")))?;
        let uuid = Uuid::parse_str(uuid)
            .map_err(|e| DomainError::invalid_id(format!("{kind}: {e}")))?;

        Ok(Self { kind, uuid })
    }

    /// Decode a global id and require it to address a node of kind `K::KIND`.
    pub fn decode_as<K: NodeKey>(raw: &str) -> DomainResult<K> {
        let id = Self::decode(raw)?;
        if id.kind != K::KIND {
            return Err(DomainError::invalid_id(format!(
                "expected {} id, got {}",
                K::KIND,
                id.kind
            )));
        }
        Ok(K::from(id.uuid))
    }
}

impl core::fmt::Display for GlobalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let raw = format!("{}:{}", self.kind, self.uuid);
        f.write_str(&URL_SAFE_NO_PAD.encode(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn channel_id_survives_encoding() {
        let channel = ChannelId::new();
        let raw = GlobalId::encode(channel);
        assert_eq!(GlobalId::decode_as::<ChannelId>(&raw).unwrap(), channel);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let raw = GlobalId::encode(ProductId::new());
        let err = GlobalId::decode_as::<ChannelId>(&raw).unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.contains("expected Channel")),
            _ => panic!("Expected InvalidId"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let raw = URL_SAFE_NO_PAD.encode(format!("Warehouse:{}", Uuid::now_v7()));
        assert!(GlobalId::decode(&raw).is_err());
    }

    #[test]
    fn raw_uuid_is_not_a_global_id() {
        let raw = Uuid::now_v7().to_string();
        assert!(GlobalId::decode(&raw).is_err());
    }

    #[test]
    fn surrounding_whitespace_is_not_stripped() {
        let raw = GlobalId::encode(ChannelId::new());
        assert!(GlobalId::decode(&format!(" {raw}")).is_err());
        assert!(GlobalId::decode(&format!("{raw}\n")).is_err());
    }

    #[test]
    fn category_ids_have_their_own_kind() {
        let category = CategoryId::new();
        let raw = GlobalId::encode(category);
        assert_eq!(GlobalId::decode(&raw).unwrap().kind, NodeKind::Category);
        assert!(GlobalId::decode_as::<ChannelId>(&raw).is_err());
    }

    proptest! {
        #[test]
        fn decode_never_panics(raw in ".*") {
            let _ = GlobalId::decode(&raw);
        }
    }
}
