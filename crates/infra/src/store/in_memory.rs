use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::RwLock;

use vapers_core::{DomainError, DomainResult};

use super::repository::Repository;

#[derive(Debug)]
struct Records<K, V> {
    order: Vec<K>,
    by_key: HashMap<K, V>,
}

/// In-memory repository for tests/dev.
///
/// Keeps a side vector of keys so listings come back in insertion order.
#[derive(Debug)]
pub struct InMemoryRepository<K, V> {
    inner: RwLock<Records<K, V>>,
}

impl<K, V> InMemoryRepository<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Records {
                order: Vec::new(),
                by_key: HashMap::new(),
            }),
        }
    }
}

impl<K, V> Default for InMemoryRepository<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> DomainError {
    DomainError::invariant("repository lock poisoned")
}

impl<K, V> Repository<K, V> for InMemoryRepository<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> DomainResult<Option<V>> {
        let records = self.inner.read().map_err(|_| poisoned())?;
        Ok(records.by_key.get(key).cloned())
    }

    fn insert(&self, key: K, value: V) -> DomainResult<()> {
        let mut records = self.inner.write().map_err(|_| poisoned())?;
        if records.by_key.contains_key(&key) {
            return Err(DomainError::conflict(format!("record {key} already exists")));
        }
        records.order.push(key.clone());
        records.by_key.insert(key, value);
        Ok(())
    }

    fn upsert(&self, key: K, value: V) -> DomainResult<()> {
        let mut records = self.inner.write().map_err(|_| poisoned())?;
        if !records.by_key.contains_key(&key) {
            records.order.push(key.clone());
        }
        records.by_key.insert(key, value);
        Ok(())
    }

    fn list(&self) -> DomainResult<Vec<V>> {
        let records = self.inner.read().map_err(|_| poisoned())?;
        Ok(records
            .order
            .iter()
            .filter_map(|k| records.by_key.get(k).cloned())
            .collect())
    }

    fn update(
        &self,
        key: &K,
        apply: &mut dyn FnMut(&mut V) -> DomainResult<()>,
    ) -> DomainResult<V> {
        let mut records = self.inner.write().map_err(|_| poisoned())?;
        let stored = records
            .by_key
            .get_mut(key)
            .ok_or_else(DomainError::not_found)?;

        let mut next = stored.clone();
        apply(&mut next)?;
        *stored = next.clone();
        Ok(next)
    }

    fn len(&self) -> DomainResult<usize> {
        let records = self.inner.read().map_err(|_| poisoned())?;
        Ok(records.by_key.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> InMemoryRepository<u32, String> {
        InMemoryRepository::new()
    }

    #[test]
    fn list_preserves_insertion_order() {
        let r = repo();
        for k in [30, 10, 20] {
            r.insert(k, format!("v{k}")).unwrap();
        }
        r.upsert(10, "v10b".to_string()).unwrap();

        assert_eq!(r.list().unwrap(), vec!["v30", "v10b", "v20"]);
        assert_eq!(r.len().unwrap(), 3);
    }

    #[test]
    fn insert_rejects_duplicate_keys() {
        let r = repo();
        r.insert(1, "a".to_string()).unwrap();
        assert!(matches!(r.insert(1, "b".to_string()), Err(DomainError::Conflict(_))));
        assert_eq!(r.get(&1).unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn update_writes_back_only_on_success() {
        let r = repo();
        r.insert(1, "a".to_string()).unwrap();

        let updated = r
            .update(&1, &mut |v| {
                v.push('!');
                Ok(())
            })
            .unwrap();
        assert_eq!(updated, "a!");

        let failed = r.update(&1, &mut |v| {
            v.clear();
            Err(DomainError::validation("nope"))
        });
        assert!(matches!(failed, Err(DomainError::Validation(_))));
        assert_eq!(r.get(&1).unwrap().as_deref(), Some("a!"));

        assert!(matches!(
            r.update(&9, &mut |_| Ok(())),
            Err(DomainError::NotFound)
        ));
    }

    // A writer that panicked mid-update leaves the lock poisoned.
    fn poison(r: &InMemoryRepository<u32, String>) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = r.inner.write().unwrap();
            panic!("writer died holding the lock");
        }));
        assert!(result.is_err());
    }

    #[test]
    fn poisoned_lock_fails_every_call_instead_of_dropping_data() {
        let r = repo();
        r.insert(1, "a".to_string()).unwrap();
        poison(&r);

        let upsert = r.upsert(1, "b".to_string());
        assert!(matches!(upsert, Err(DomainError::InvariantViolation(_))));
        let insert = r.insert(2, "c".to_string());
        assert!(matches!(insert, Err(DomainError::InvariantViolation(_))));
        assert!(matches!(r.get(&1), Err(DomainError::InvariantViolation(_))));
        assert!(matches!(r.list(), Err(DomainError::InvariantViolation(_))));
        assert!(matches!(r.len(), Err(DomainError::InvariantViolation(_))));
        assert!(matches!(
            r.update(&1, &mut |_| Ok(())),
            Err(DomainError::InvariantViolation(_))
        ));
    }
}
