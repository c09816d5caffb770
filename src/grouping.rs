use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::{
    batch_function::{BatchFunction, BulkFetch},
    error::StoreError,
};

/// Keys each fetched row by `key_of(row)`. Keys without a row stay absent.
pub struct ByKey<F, X, R> {
    fetch: F,
    key_of: X,
    _row: PhantomData<fn() -> R>,
}

/// Groups fetched rows by `key_of(row)`, keeping the store's row order. Every requested key gets
/// a sequence, empty when nothing matched.
pub struct GroupBy<F, X, R> {
    fetch: F,
    key_of: X,
    _row: PhantomData<fn() -> R>,
}

pub fn by_key<K, R, F, X>(fetch: F, key_of: X) -> ByKey<F, X, R>
where
    F: BulkFetch<K, R>,
    X: Fn(&R) -> K + Send + Sync + 'static,
{
    ByKey { fetch, key_of, _row: PhantomData }
}

pub fn group_by<K, R, F, X>(fetch: F, key_of: X) -> GroupBy<F, X, R>
where
    F: BulkFetch<K, R>,
    X: Fn(&R) -> K + Send + Sync + 'static,
{
    GroupBy { fetch, key_of, _row: PhantomData }
}

#[async_trait]
impl<K, R, F, X> BatchFunction<K, R> for ByKey<F, X, R>
where
    K: Send + Sync + 'static,
    R: Send + Sync + 'static,
    F: BulkFetch<K, R>,
    X: Fn(&R) -> K + Send + Sync + 'static,
{
    async fn load(&self, keys: &[K]) -> Result<Vec<(K, R)>, StoreError> {
        let rows = self.fetch.fetch(keys).await?;
        Ok(rows.into_iter().map(|row| ((self.key_of)(&row), row)).collect())
    }
}

#[async_trait]
impl<K, R, F, X> BatchFunction<K, Vec<R>> for GroupBy<F, X, R>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    R: Send + Sync + 'static,
    F: BulkFetch<K, R>,
    X: Fn(&R) -> K + Send + Sync + 'static,
{
    async fn load(&self, keys: &[K]) -> Result<Vec<(K, Vec<R>)>, StoreError> {
        let rows = self.fetch.fetch(keys).await?;
        let mut grouped: HashMap<K, Vec<R>> = HashMap::with_capacity(keys.len());
        for row in rows {
            grouped.entry((self.key_of)(&row)).or_default().push(row);
        }
        Ok(keys
            .iter()
            .map(|key| {
                let rows = grouped.remove(key).unwrap_or_default();
                (key.clone(), rows)
            })
            .collect())
    }
}
