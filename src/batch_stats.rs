/// Counters describing how well a single loader batched its requests during one unit of work.
///
/// Reported at `debug` level when the worker shuts down.
#[derive(Debug, Default)]
pub struct BatchStats {
    /// Name of the loader these stats belong to.
    loader: &'static str,
    /// Number of load requests received by the worker.
    load_requests: u32,
    /// The total number of keys that were requested (not necessarily unique).
    keys_requested: u32,
    /// The number of keys that were immediately found in the unit-of-work cache.
    cache_hits: u32,
    /// Number of execution frames that ran the batch function.
    dispatches: u32,
    /// Number of dispatches whose bulk fetch failed.
    failures: u32,
    /// The average number of unique keys per dispatch.
    average_batch_size: f32,
    max_batch_size: u32,
    min_batch_size: u32,
}

impl BatchStats {
    pub fn new(loader: &'static str) -> Self {
        Self { loader, min_batch_size: u32::MAX, ..Default::default() }
    }

    pub fn record_request(&mut self, keys: u32) {
        self.load_requests += 1;
        self.keys_requested += keys;
    }

    pub fn record_cache_hits(&mut self, hits: u32) {
        self.cache_hits += hits;
    }

    pub fn record_dispatch(&mut self, batch_size: u32) {
        let dispatches = self.dispatches + 1;
        self.average_batch_size = (((self.average_batch_size as f64 * self.dispatches as f64)
            + batch_size as f64)
            / dispatches as f64) as f32;
        self.dispatches = dispatches;
        self.max_batch_size = self.max_batch_size.max(batch_size);
        self.min_batch_size = self.min_batch_size.min(batch_size);
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }
}

impl Drop for BatchStats {
    fn drop(&mut self) {
        tracing::debug!(loader = self.loader, batch_stats = ?self);
    }
}
