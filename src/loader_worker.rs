use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::mpsc;

#[cfg(feature = "stats")]
use crate::batch_stats::BatchStats;
use crate::{
    batch_function::BatchFunction,
    cache::{Cache, Slot},
    config::LoaderConfig,
    error::LoadError,
    loader_op::{LoadRequest, LoaderOp},
};

/// A `LoaderWorker` is the "single-thread" worker task that actually does the loading work for
/// one loader within one unit of work.
///
/// Once started, it runs in a loop until the parent Loader aborts its `JoinHandle` or drops the
/// request queue tx channel.
///
/// The worker can be in one of four states during its lifetime:
///
/// 1. Waiting for requests
/// 2. Waiting on its `FlushTrigger` while resolvers enqueue more requests.
/// 3. Flushing the request queue and staging keys for loading.
/// 4. Executing its batch function.
///
/// One cycle through this loop may be called an "execution frame".
///
/// In state (1), the worker awaits any messages on the request queue channel, idling until work
/// arrives, then handles everything already queued. If some load could not be answered from the
/// cache, it moves to (2), so that every resolver that can run gets to register its keys. States
/// (2) and (3) repeat until one wait on the trigger ends with nothing new in the queue.
///
/// In state (3), the worker synchronously pulls requests from the queue until it is empty.
/// Prime and Clear requests are resolved immediately against the cache. For Load requests, the
/// worker checks if the request can be resolved immediately from the cache. If so, it sends the
/// value on the load request's response channel, otherwise it stages the missing keys.
///
/// In state (4), the worker invokes its `BatchFunction` once with the unique staged keys. The
/// returned values for those keys are inserted into the cache, keys that were not returned are cached as absent,
/// and outstanding Load requests are resolved from the cache. If the batch function fails, every
/// outstanding Load request receives the same error and nothing is cached.
pub struct LoaderWorker<K, V, F, CacheT>
where
    F: BatchFunction<K, V>,
{
    name: &'static str,
    cache: CacheT,
    request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
    keys_to_load: Vec<K>,
    pending_requests: Vec<LoadRequest<K, V>>,
    batch_fn: Arc<F>,
    config: LoaderConfig,
    #[cfg(feature = "stats")]
    stats: BatchStats,
}

impl<K, V, F, CacheT> LoaderWorker<K, V, F, CacheT>
where
    K: 'static + Eq + Hash + Ord + Clone + Debug + Send + Sync,
    V: 'static + Send + Sync + Debug,
    F: BatchFunction<K, V>,
    CacheT: Cache<K = K, V = V>,
{
    pub fn new(
        name: &'static str,
        cache: CacheT,
        request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
        batch_fn: Arc<F>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            name,
            cache,
            request_rx,
            keys_to_load: Vec::new(),
            pending_requests: Vec::new(),
            batch_fn,
            config,
            #[cfg(feature = "stats")]
            stats: BatchStats::new(name),
        }
    }

    pub async fn start(mut self) {
        loop {
            // Async await until we receive the first op.
            match self.request_rx.recv().await {
                None => {
                    tracing::info!(
                        loader = self.name,
                        "Tx channel closed. Terminating LoaderWorker."
                    );
                    return;
                }
                Some(op) => self.mux_op(op),
            }
            self.drain_queue();
            if self.pending_requests.is_empty() {
                continue;
            }
            // Keep the frame open while resolvers are still enqueueing keys.
            loop {
                self.config.flush.ready().await;
                if self.drain_queue() == 0 {
                    break;
                }
            }
            self.execute_load().await;
        }
    }

    /// Handles every op already queued, returning how many there were. `try_recv` is not
    /// subject to the runtime's cooperative budget, so a large frame is never cut short.
    fn drain_queue(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(op) = self.request_rx.try_recv() {
            self.mux_op(op);
            drained += 1;
        }
        drained
    }

    #[tracing::instrument(skip(self), fields(loader = self.name))]
    fn mux_op(&mut self, op: LoaderOp<K, V>) {
        match op {
            LoaderOp::Load(request) => {
                let cached = self.cache.get_key_vals(request.keys());
                let keys_to_load = cached
                    .iter()
                    .filter_map(|(k, v)| if v.is_none() { Some((*k).clone()) } else { None })
                    .collect::<Vec<_>>();
                tracing::debug!(requested_keys = ?request.keys(), ?keys_to_load);
                #[cfg(feature = "stats")]
                {
                    let requested = request.keys().len() as u32;
                    self.stats.record_request(requested);
                    self.stats.record_cache_hits(requested - keys_to_load.len() as u32);
                }
                if keys_to_load.is_empty() {
                    let slots = cached.into_iter().map(|(_k, v)| v).collect::<Vec<_>>();
                    request.send_response(slots);
                } else {
                    self.keys_to_load.extend(keys_to_load);
                    self.pending_requests.push(request);
                }
            }
            LoaderOp::Prime(key, value) => self.cache.insert(key, Some(Arc::new(value))),
            LoaderOp::PrimeMany(key_vals) => self
                .cache
                .insert_many(key_vals.into_iter().map(|(k, v)| (k, Some(Arc::new(v))))),
            LoaderOp::Clear(key) => self.cache.remove(std::slice::from_ref(&key)),
            LoaderOp::ClearMany(keys) => self.cache.remove(&keys),
        }
    }

    #[tracing::instrument(skip(self), fields(loader = self.name))]
    async fn execute_load(&mut self) {
        self.keys_to_load.sort();
        self.keys_to_load.dedup();
        let keys = std::mem::take(&mut self.keys_to_load);
        #[cfg(feature = "stats")]
        self.stats.record_dispatch(keys.len() as u32);

        match self.fetch(&keys).await {
            Ok(loaded_keyvals) => {
                tracing::debug!(batch_size = keys.len(), loaded = loaded_keyvals.len());
                // Rows for keys nobody asked for would replace values callers already hold.
                self.cache.insert_many(
                    loaded_keyvals.into_iter().filter(|(k, _v)| keys.binary_search(k).is_ok()),
                );
                let missing =
                    keys.into_iter().filter(|k| !self.cache.contains(k)).collect::<Vec<_>>();
                if !missing.is_empty() {
                    tracing::debug!(?missing, "keys absent from store");
                }
                self.cache.insert_many(missing.into_iter().map(|k| (k, None)));

                for request in self.pending_requests.drain(..) {
                    let slots = self.cache.get(request.keys());
                    request.send_response(slots);
                }
            }
            Err(error) => {
                tracing::warn!(%error, batch_size = keys.len(), "bulk fetch failed");
                #[cfg(feature = "stats")]
                self.stats.record_failure();
                for request in self.pending_requests.drain(..) {
                    request.send_error(error.clone());
                }
            }
        }
    }

    /// Runs the batch function over `keys`, chunked by `max_batch_size`. The first failing chunk
    /// fails the whole frame.
    async fn fetch(&self, keys: &[K]) -> Result<Vec<(K, Slot<V>)>, LoadError> {
        let chunk_size = self.config.max_batch_size.map_or(keys.len(), |max| max.get()).max(1);
        let mut loaded = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(chunk_size) {
            let values = self
                .batch_fn
                .load(chunk)
                .await
                .map_err(|source| LoadError::Fetch { loader: self.name, source: Arc::new(source) })?;
            loaded.extend(values.into_iter().map(|(k, v)| (k, Some(Arc::new(v)))));
        }
        Ok(loaded)
    }
}
