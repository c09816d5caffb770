use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by an entity store while serving a bulk fetch.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("entity store unavailable: {0}")]
    Unavailable(String),

    /// The bulk fetch did not complete in time.
    #[error("bulk fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The store rejected or failed the query.
    #[error("query failed: {0}")]
    Query(String),
}

/// Errors observed by callers of [`crate::Loader`] and [`crate::UnitOfWork`].
///
/// Cloneable so that one failed batch can hand the same error to every waiter.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The bulk fetch covering this key failed. Every key of the batch sees the same source.
    #[error("bulk fetch for loader `{loader}` failed: {source}")]
    Fetch {
        loader: &'static str,
        #[source]
        source: Arc<StoreError>,
    },

    /// The unit of work was torn down while the request was still pending.
    #[error("unit of work was torn down before loader `{0}` resolved the request")]
    Cancelled(&'static str),

    /// A request was issued after the owning unit of work ended.
    #[error("loader `{0}` used after its unit of work ended")]
    UnitOfWorkEnded(&'static str),

    /// No loader is registered under this name.
    #[error("no loader registered as `{0}`")]
    UnknownLoader(&'static str),

    /// A loader exists under this name but with different key or value types.
    #[error("loader `{0}` is registered with different key/value types")]
    TypeMismatch(&'static str),
}

/// Errors raised while building a [`crate::LoaderRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("loader `{0}` is already registered")]
    DuplicateLoader(&'static str),
}
