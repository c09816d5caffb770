use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// Cached outcome of loading one key: `Some` when the store returned a value, `None` when the
/// key was requested but the store had nothing for it.
pub type Slot<V> = Option<Arc<V>>;

/// Storage for the values a loader has resolved during one unit of work.
///
/// The cache lives inside a single `LoaderWorker` and is dropped with it, so it needs no
/// eviction policy and no locking.
pub trait Cache {
    type K;
    type V;

    /// Returns the cached slots associated with the provided keys, in order with their
    /// respective keys. A `None` entry means the key has not been loaded yet.
    fn get(&self, keys: &[Self::K]) -> Vec<Option<&Slot<Self::V>>>;

    /// Returns key slot pairs for the requested keys.
    fn get_key_vals<'cache, 'a>(
        &'cache self,
        keys: &'a [Self::K],
    ) -> Vec<(&'a Self::K, Option<&'cache Slot<Self::V>>)>;

    fn contains(&self, key: &Self::K) -> bool;

    fn insert(&mut self, key: Self::K, slot: Slot<Self::V>);
    fn insert_many<I: IntoIterator<Item = (Self::K, Slot<Self::V>)>>(&mut self, key_slots: I);

    fn remove(&mut self, keys: &[Self::K]);
}

impl<K, V, S: BuildHasher> Cache for HashMap<K, Slot<V>, S>
where
    K: Eq + Hash,
{
    type K = K;
    type V = V;

    fn get(&self, keys: &[Self::K]) -> Vec<Option<&Slot<Self::V>>> {
        keys.iter().map(|k| self.get(k)).collect::<Vec<_>>()
    }

    fn get_key_vals<'cache, 'a>(
        &'cache self,
        keys: &'a [Self::K],
    ) -> Vec<(&'a Self::K, Option<&'cache Slot<Self::V>>)> {
        keys.iter().map(|k| (k, self.get(k))).collect::<Vec<_>>()
    }

    fn contains(&self, key: &Self::K) -> bool {
        self.contains_key(key)
    }

    fn insert(&mut self, key: Self::K, slot: Slot<Self::V>) {
        self.insert(key, slot);
    }

    fn insert_many<I: IntoIterator<Item = (Self::K, Slot<Self::V>)>>(&mut self, key_slots: I) {
        for (key, slot) in key_slots.into_iter() {
            self.insert(key, slot);
        }
    }

    fn remove(&mut self, keys: &[Self::K]) {
        for key in keys.iter() {
            self.remove(key);
        }
    }
}
