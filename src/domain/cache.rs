use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Keyed store holding the latest known state of foreign entities
pub trait EntityCache<T>: Send + Sync {
    /// Last known state of the entity, if it has ever been seen
    fn get(&self, id: &str) -> Option<T>;

    /// Replaces the stored state of the entity, inserting it if it is unknown
    fn upsert(&self, id: String, entity: T);
}

/// In-memory [`EntityCache`] which lives as long as the process
///
/// Entries are never evicted. Writes replace the whole entity, thus applying the same state
/// twice leaves the cache unchanged and the last write wins.
pub struct ConsistencyCache<T> {
    entries: RwLock<HashMap<String, T>>,
}

impl<T> ConsistencyCache<T> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached entities
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no entity has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ConsistencyCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityCache<T> for ConsistencyCache<T>
where
    T: Clone + Send + Sync,
{
    fn get(&self, id: &str) -> Option<T> {
        // Writers only ever insert whole entries, poisoning is ignored
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn upsert(&self, id: String, entity: T) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, entity);
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::domain::{User, UserDetails};
    use pretty_assertions::assert_eq;

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            ..User::new(UserDetails {
                name: name.into(),
                email: format!("{}@example.com", name),
            })
        }
    }

    #[test]
    fn apply_duplicates_idempotently() {
        let cache = ConsistencyCache::new();
        let entity = user("u_1", "A");

        cache.upsert(entity.id.clone(), entity.clone());
        cache.upsert(entity.id.clone(), entity.clone());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("u_1"), Some(entity));
    }

    #[test]
    fn overwrite_instead_of_merge() {
        let cache = ConsistencyCache::new();
        let created = user("u_1", "A");
        let updated = User {
            email: "b@example.org".into(),
            ..user("u_1", "B")
        };

        cache.upsert(created.id.clone(), created);
        cache.upsert(updated.id.clone(), updated.clone());

        assert_eq!(cache.get("u_1"), Some(updated));
    }

    #[test]
    fn miss_unknown_entities() {
        let cache: ConsistencyCache<User> = ConsistencyCache::default();

        assert!(cache.is_empty());
        assert_eq!(cache.get("u_unknown"), None);
    }
}
