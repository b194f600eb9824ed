use std::sync::Arc;

use vapers_core::{DomainResult, Entity};

/// Keyed record store.
///
/// `list` returns records in insertion order. `update` applies `apply` to a
/// copy of the stored value and only writes it back when `apply` succeeds.
/// Every call reports storage failures; none of them degrade to an empty or
/// missing result.
pub trait Repository<K, V>: Send + Sync {
    fn get(&self, key: &K) -> DomainResult<Option<V>>;

    /// Insert a new record; fails with `Conflict` when `key` is taken.
    fn insert(&self, key: K, value: V) -> DomainResult<()>;

    /// Insert an entity under its own id.
    fn add(&self, entity: V) -> DomainResult<()>
    where
        K: Clone,
        V: Entity<Id = K>,
    {
        let key = entity.id().clone();
        self.insert(key, entity)
    }

    fn upsert(&self, key: K, value: V) -> DomainResult<()>;

    fn list(&self) -> DomainResult<Vec<V>>;

    /// Fails with `NotFound` when `key` is absent.
    fn update(
        &self,
        key: &K,
        apply: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> DomainResult<V>;

    fn len(&self) -> DomainResult<usize>;

    fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<K, V, S> Repository<K, V> for Arc<S>
where
    S: Repository<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> DomainResult<Option<V>> {
        (**self).get(key)
    }

    fn insert(&self, key: K, value: V) -> DomainResult<()> {
        (**self).insert(key, value)
    }

    fn upsert(&self, key: K, value: V) -> DomainResult<()> {
        (**self).upsert(key, value)
    }

    fn list(&self) -> DomainResult<Vec<V>> {
        (**self).list()
    }

    fn update(
        &self,
        key: &K,
        apply: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> DomainResult<V> {
        (**self).update(key, apply)
    }

    fn len(&self) -> DomainResult<usize> {
        (**self).len()
    }
}
