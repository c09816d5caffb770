use std::sync::Arc;

use crate::{error::LoadError, registry::LoaderId, unit_of_work::UnitOfWork};

/// A parent that refers to at most one child through a key it carries, e.g. a line item's
/// product.
pub struct BelongsTo<P, K, V> {
    pub loader: LoaderId<K, V>,
    pub key: fn(&P) -> K,
}

/// A parent that owns a sequence of children pointing back at it, e.g. a customer's orders.
///
/// The backing loader must yield a sequence per key, as produced by [`crate::group_by`].
pub struct HasMany<P, K, V> {
    pub loader: LoaderId<K, Vec<V>>,
    pub key: fn(&P) -> K,
}

impl<P, K, V> BelongsTo<P, K, V>
where
    K: 'static,
    V: 'static,
{
    pub const fn new(loader: LoaderId<K, V>, key: fn(&P) -> K) -> Self {
        Self { loader, key }
    }

    /// Resolves the child of `parent`, `None` when the store has no row for the key.
    pub async fn resolve(&self, uow: &UnitOfWork, parent: &P) -> Result<Option<Arc<V>>, LoadError> {
        uow.load(&self.loader, (self.key)(parent)).await
    }
}

impl<P, K, V> HasMany<P, K, V>
where
    K: 'static,
    V: 'static,
{
    pub const fn new(loader: LoaderId<K, Vec<V>>, key: fn(&P) -> K) -> Self {
        Self { loader, key }
    }

    /// Resolves the children of `parent`; a parent without children gets an empty sequence.
    pub async fn resolve(&self, uow: &UnitOfWork, parent: &P) -> Result<Arc<Vec<V>>, LoadError> {
        let children = uow.load(&self.loader, (self.key)(parent)).await?;
        Ok(children.unwrap_or_default())
    }
}
