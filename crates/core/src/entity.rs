//! Records with a stable identity.

/// Anything stored under its own id: products, sales, purchases and
/// finance entries.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
