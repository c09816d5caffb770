use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    error::LoadError,
    loader::Loader,
    registry::{ErasedLoader, LoaderId, LoaderRegistry},
};

static NEXT_UNIT_OF_WORK: AtomicU64 = AtomicU64::new(1);

/// The scope of one inbound request.
///
/// A unit of work exclusively owns one [`Loader`] per registered kind, and with it that loader's
/// queue, pending batch and cache. Nothing it caches is visible to any other unit of work, even
/// for identical keys. Ending it, by [`UnitOfWork::finish`], [`UnitOfWork::abort`] or drop,
/// stops every worker; requests still pending fail with [`LoadError::Cancelled`].
pub struct UnitOfWork {
    id: u64,
    loaders: HashMap<&'static str, Box<dyn ErasedLoader>>,
    span: tracing::Span,
}

impl UnitOfWork {
    /// Starts a unit of work with a fresh loader for every kind in `registry`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn begin(registry: &LoaderRegistry) -> Self {
        let id = NEXT_UNIT_OF_WORK.fetch_add(1, Ordering::Relaxed);
        let span = tracing::debug_span!("UnitOfWork", id);
        let loaders = {
            let _enter = span.enter();
            tracing::debug!("unit of work started");
            registry.instantiate()
        };
        Self { id, loaders, span }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns this unit of work's loader for `id`.
    pub fn loader<K, V>(&self, id: &LoaderId<K, V>) -> Result<&Loader<K, V>, LoadError>
    where
        K: 'static,
        V: 'static,
    {
        let erased = self.loaders.get(id.name()).ok_or(LoadError::UnknownLoader(id.name()))?;
        erased.as_any().downcast_ref::<Loader<K, V>>().ok_or(LoadError::TypeMismatch(id.name()))
    }

    /// Returns the cached or pending value for `key` under loader `id`, queuing the key for the
    /// loader's next batch if this unit of work has not requested it before.
    pub async fn load<K, V>(&self, id: &LoaderId<K, V>, key: K) -> Result<Option<Arc<V>>, LoadError>
    where
        K: 'static,
        V: 'static,
    {
        self.loader(id)?.load(key).await
    }

    pub async fn load_many<K, V>(
        &self,
        id: &LoaderId<K, V>,
        keys: Vec<K>,
    ) -> Result<Vec<Option<Arc<V>>>, LoadError>
    where
        K: 'static,
        V: 'static,
    {
        self.loader(id)?.load_many(keys).await
    }

    /// Tears the unit of work down while callers may still be waiting, e.g. on client
    /// disconnect. Requests made after this are a bug, see [`Loader::close`].
    pub fn abort(&self) {
        let _enter = self.span.enter();
        tracing::debug!(loaders = self.loaders.len(), "aborting unit of work");
        for loader in self.loaders.values() {
            loader.close();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.loaders.values().any(|loader| loader.is_closed())
    }

    /// Ends the unit of work, discarding every cached value.
    pub fn finish(self) {}
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        let _enter = self.span.enter();
        tracing::debug!("unit of work ended");
    }
}
