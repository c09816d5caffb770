mod batch_function;
#[cfg(feature = "stats")]
mod batch_stats;
mod cache;
mod config;
mod error;
mod flush;
mod grouping;
mod loader;
mod loader_op;
mod loader_worker;
mod registry;
mod relationship;
pub mod shop;
mod unit_of_work;

pub use batch_function::{BatchFunction, BulkFetch};
pub use config::LoaderConfig;
pub use error::{LoadError, RegistryError, StoreError};
pub use flush::{Delay, FlushTrigger, YieldNow};
pub use grouping::{by_key, group_by, ByKey, GroupBy};
pub use loader::Loader;
pub use registry::{LoaderId, LoaderRegistry};
pub use relationship::{BelongsTo, HasMany};
pub use unit_of_work::UnitOfWork;
