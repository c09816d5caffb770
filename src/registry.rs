use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{
    batch_function::BatchFunction, config::LoaderConfig, error::RegistryError, loader::Loader,
};

/// Typed identity of a loader kind, e.g. "orders by customer id".
///
/// The name is what a registry and unit of work look loaders up by; the type parameters make
/// sure callers get back the key and value types the loader was registered with.
pub struct LoaderId<K, V> {
    name: &'static str,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> LoaderId<K, V> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, _types: PhantomData }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<K, V> Clone for LoaderId<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for LoaderId<K, V> {}

impl<K, V> Debug for LoaderId<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoaderId").field(&self.name).finish()
    }
}

/// Type-erased view of a [`Loader`] so that one unit of work can own loaders of many key and
/// value types.
pub(crate) trait ErasedLoader: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn close(&self);
    fn is_closed(&self) -> bool;
}

impl<K, V> ErasedLoader for Loader<K, V>
where
    K: 'static + Send,
    V: 'static + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn close(&self) {
        Loader::close(self);
    }

    fn is_closed(&self) -> bool {
        Loader::is_closed(self)
    }
}

type Factory = Box<dyn Fn(&LoaderConfig) -> Box<dyn ErasedLoader> + Send + Sync>;

/// Table of loader kinds and the batch functions backing them.
///
/// A registry is built once and shared by every request. It holds no request-scoped state:
/// [`crate::UnitOfWork::begin`] instantiates a fresh loader (worker, queue and cache) for every
/// registered kind.
pub struct LoaderRegistry {
    config: LoaderConfig,
    factories: HashMap<&'static str, Factory>,
}

impl LoaderRegistry {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config, factories: HashMap::new() }
    }

    /// Registers `batch_fn` as the source of values for loader `id`.
    pub fn register<K, V, F>(
        &mut self,
        id: LoaderId<K, V>,
        batch_fn: F,
    ) -> Result<&mut Self, RegistryError>
    where
        K: 'static + Eq + Hash + Ord + Clone + Debug + Send + Sync,
        V: 'static + Send + Sync + Debug,
        F: BatchFunction<K, V>,
    {
        let name = id.name();
        if self.factories.contains_key(name) {
            return Err(RegistryError::DuplicateLoader(name));
        }
        let batch_fn = Arc::new(batch_fn);
        self.factories.insert(
            name,
            Box::new(move |config: &LoaderConfig| -> Box<dyn ErasedLoader> {
                Box::new(Loader::<K, V>::new(name, batch_fn.clone(), config.clone()))
            }),
        );
        tracing::debug!(loader = name, "registered loader");
        Ok(self)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub(crate) fn instantiate(&self) -> HashMap<&'static str, Box<dyn ErasedLoader>> {
        self.factories.iter().map(|(name, factory)| (*name, factory(&self.config))).collect()
    }
}

impl Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("config", &self.config)
            .field("loaders", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
