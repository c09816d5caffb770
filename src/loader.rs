use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Drop;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing_futures::Instrument;

use crate::{
    batch_function::BatchFunction,
    cache::Slot,
    config::LoaderConfig,
    error::LoadError,
    loader_op::{LoadRequest, LoaderOp},
    loader_worker::LoaderWorker,
};

/// Batch loads values from some expensive resource for the duration of one unit of work,
/// primarily intended for mitigating GraphQL's N+1 problem.
///
/// Users can call [`Loader::load`] and [`Loader::load_many`] to fetch values from the underlying
/// resource or cache. The cache can be cleared with calls to [`Loader::clear`] and
/// [`Loader::clear_many`], and values can be added to the cache out-of-band through the use of
/// [`Loader::prime`] and [`Loader::prime_many`].
///
/// The `Loader` struct acts as an intermediary between the async domain in which `load` calls are
/// invoked and the pseudo-single-threaded domain of the `LoaderWorker`. Callers can invoke the
/// `Loader` from multiple parallel tasks, and the loader will enqueue the requested operations on
/// the request queue for processing by its `LoaderWorker`. The worker processes the requests
/// sequentially and provides results via response oneshot channels back to the Loader.
///
/// Values are handed out as `Arc`s: every request for the same key within the loader's lifetime
/// observes the same allocation.
pub struct Loader<K, V> {
    name: &'static str,
    request_tx: mpsc::UnboundedSender<LoaderOp<K, V>>,
    load_task_handle: tokio::task::JoinHandle<()>,
    closed: AtomicBool,
}

impl<K, V> Drop for Loader<K, V> {
    fn drop(&mut self) {
        self.load_task_handle.abort();
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Hash + Ord + Clone + Debug + Send + Sync,
    V: 'static + Send + Sync + Debug,
{
    /// Creates a new Loader backed by `batch_fn` and spawns its worker on the current tokio
    /// runtime.
    pub fn new<F>(name: &'static str, batch_fn: Arc<F>, config: LoaderConfig) -> Self
    where
        F: BatchFunction<K, V>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = LoaderWorker::<K, V, F, HashMap<K, Slot<V>>>::new(
            name,
            HashMap::new(),
            rx,
            batch_fn,
            config,
        );
        Self {
            name,
            request_tx: tx,
            load_task_handle: tokio::task::spawn(
                worker.start().instrument(tracing::trace_span!("LoaderWorker", loader = name)),
            ),
            closed: AtomicBool::new(false),
        }
    }
}

impl<K, V> Loader<K, V> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Loads a value from the underlying resource.
    ///
    /// Returns `Ok(None)` if the resource has no value for `key`.
    ///
    /// If the value is already in the loader cache, it is returned as soon as it is processed.
    /// Otherwise, the requested key is enqueued for batch loading in the next loader execution
    /// frame.
    pub async fn load(&self, key: K) -> Result<Option<Arc<V>>, LoadError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(LoaderOp::Load(LoadRequest::One(key, response_tx)))?;
        response_rx.await.map_err(|_| LoadError::Cancelled(self.name))?
    }

    /// Loads many values at once.
    ///
    /// Returns `None` in the positions of keys the resource has no value for.
    ///
    /// If all the values are already present in the loader cache, they are returned as soon as
    /// the request is processed by the worker. Otherwise, the missing keys are enqueued for batch
    /// loading in the next loader execution frame.
    pub async fn load_many(&self, keys: Vec<K>) -> Result<Vec<Option<Arc<V>>>, LoadError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(LoaderOp::Load(LoadRequest::Many(keys, response_tx)))?;
        response_rx.await.map_err(|_| LoadError::Cancelled(self.name))?
    }

    /// Adds a value to the cache.
    pub fn prime(&self, key: K, value: V) -> Result<(), LoadError> {
        self.send(LoaderOp::Prime(key, value))
    }

    /// Adds many values to the cache at once.
    pub fn prime_many(&self, key_vals: Vec<(K, V)>) -> Result<(), LoadError> {
        self.send(LoaderOp::PrimeMany(key_vals))
    }

    /// Removes a value from the cache.
    ///
    /// This key will be reloaded when it is next requested.
    pub fn clear(&self, key: K) -> Result<(), LoadError> {
        self.send(LoaderOp::Clear(key))
    }

    /// Removes multiple values from the cache at once.
    ///
    /// These keys will be reloaded when requested.
    pub fn clear_many(&self, keys: Vec<K>) -> Result<(), LoadError> {
        self.send(LoaderOp::ClearMany(keys))
    }

    /// Stops the worker. Pending requests fail with [`LoadError::Cancelled`]. Using the loader
    /// afterwards is a bug: it panics in debug builds and fails with
    /// [`LoadError::UnitOfWorkEnded`] otherwise.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.load_task_handle.abort();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn send(&self, op: LoaderOp<K, V>) -> Result<(), LoadError> {
        let closed = self.is_closed();
        debug_assert!(!closed, "loader `{}` used after its unit of work ended", self.name);
        if closed {
            tracing::error!(loader = self.name, "loader used after its unit of work ended");
            return Err(LoadError::UnitOfWorkEnded(self.name));
        }
        self.request_tx.send(op).map_err(|_| {
            tracing::error!(loader = self.name, "loader worker is gone");
            LoadError::UnitOfWorkEnded(self.name)
        })
    }
}
