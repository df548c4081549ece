//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Channels, products and variants are entities; listing rows are keyed by
/// a pair of entity ids instead.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
