use std::future::Future;

use async_trait::async_trait;

use crate::error::StoreError;

/// A `BatchFunction` defines the method through which some `Loader` may fetch
/// batched data from some resource. The `BatchFunction` receives a slice of unique, sorted keys
/// that have been requested during the `Loader`'s most recent execution frame.
///
/// The `BatchFunction` is not required to return a result for all keys that were provided.
/// Instead, it can return any set of loaded key value pairs, in any order it chooses. Requesters
/// of keys whose values are not returned will receive a `None`.
///
/// An `Err` fails the whole batch: every requester waiting on it receives the same error.
///
/// Batch functions are shared by every unit of work created from one registry, so they must not
/// hold request-scoped state.
#[async_trait]
pub trait BatchFunction<K, V>: Send + Sync + 'static {
    async fn load(&self, keys: &[K]) -> Result<Vec<(K, V)>, StoreError>;
}

/// Raw bulk access to an entity store: all rows matching any of `keys`.
///
/// Implemented for any `Fn(Vec<K>) -> impl Future<Output = Result<Vec<R>, StoreError>>`, so a
/// store method can be plugged in with a closure.
#[async_trait]
pub trait BulkFetch<K, R>: Send + Sync + 'static {
    async fn fetch(&self, keys: &[K]) -> Result<Vec<R>, StoreError>;
}

#[async_trait]
impl<K, R, F, Fut> BulkFetch<K, R> for F
where
    K: Clone + Send + Sync + 'static,
    R: Send + 'static,
    F: Fn(Vec<K>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<R>, StoreError>> + Send + 'static,
{
    async fn fetch(&self, keys: &[K]) -> Result<Vec<R>, StoreError> {
        (self)(keys.to_vec()).await
    }
}
