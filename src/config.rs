use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::flush::{FlushTrigger, YieldNow};

/// Settings shared by every loader a registry creates.
#[derive(Clone)]
pub struct LoaderConfig {
    /// Decides when a worker stops collecting keys and runs its batch.
    pub flush: Arc<dyn FlushTrigger>,
    /// Upper bound on keys per store call. A larger frame is fetched in sequential chunks but
    /// still succeeds or fails as one batch.
    pub max_batch_size: Option<NonZeroUsize>,
}

impl LoaderConfig {
    pub fn with_flush<T: FlushTrigger>(mut self, trigger: T) -> Self {
        self.flush = Arc::new(trigger);
        self
    }

    pub fn with_max_batch_size(mut self, max: NonZeroUsize) -> Self {
        self.max_batch_size = Some(max);
        self
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { flush: Arc::new(YieldNow::default()), max_batch_size: None }
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig").field("max_batch_size", &self.max_batch_size).finish()
    }
}
