//! `storefront-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the opaque global id codec used at the API boundary, and
//! the domain error model.

pub mod entity;
pub mod error;
pub mod global_id;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use global_id::{GlobalId, NodeKey, NodeKind};
pub use id::{CategoryId, ChannelId, ProductId, VariantId};
pub use value_object::ValueObject;
