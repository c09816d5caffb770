use std::slice;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::{cache::Slot, error::LoadError};

pub type OneResponse<V> = Result<Option<Arc<V>>, LoadError>;
pub type ManyResponse<V> = Result<Vec<Option<Arc<V>>>, LoadError>;

/// Set of possible requests that can be sent to the [`LoaderWorker`]
///
/// The three categories of commands are Load, Prime, and Clear; each of which has a single and
/// many variant for convenience.
///
/// [`LoaderWorker`]: crate::loader_worker::LoaderWorker
#[derive(Debug)]
pub enum LoaderOp<K, V> {
    /// Fetch data from the resource wrapped by this data loader (or the cache).
    Load(LoadRequest<K, V>),
    /// Add values to the cache that were fetched from elsewhere.
    Prime(K, V),
    PrimeMany(Vec<(K, V)>),
    /// Remove values from the cache so that they will be reloaded when they are next requested.
    Clear(K),
    ClearMany(Vec<K>),
}

#[derive(Debug)]
pub enum LoadRequest<K, V> {
    One(K, oneshot::Sender<OneResponse<V>>),
    Many(Vec<K>, oneshot::Sender<ManyResponse<V>>),
}

impl<K, V> LoadRequest<K, V>
where
    V: Send + std::fmt::Debug,
{
    pub fn keys(&self) -> &[K] {
        match self {
            LoadRequest::One(ref key, _) => slice::from_ref(key),
            LoadRequest::Many(ref keys, _) => keys,
        }
    }

    /// Resolves the request from cache slots given in the same order as [`LoadRequest::keys`].
    pub fn send_response<'a, I>(self, slots: I)
    where
        I: IntoIterator<Item = Option<&'a Slot<V>>>,
        V: 'a,
    {
        match self {
            LoadRequest::One(_, response_tx) => {
                let response = slots.into_iter().next().flatten().and_then(Clone::clone);
                if response_tx.send(Ok(response)).is_err() {
                    tracing::error!("receiver dropped");
                }
            }
            LoadRequest::Many(_, response_tx) => {
                let response =
                    slots.into_iter().map(|slot| slot.and_then(Clone::clone)).collect::<Vec<_>>();
                if response_tx.send(Ok(response)).is_err() {
                    tracing::error!("receiver dropped");
                }
            }
        }
    }

    pub fn send_error(self, error: LoadError) {
        let sent = match self {
            LoadRequest::One(_, response_tx) => response_tx.send(Err(error)).is_ok(),
            LoadRequest::Many(_, response_tx) => response_tx.send(Err(error)).is_ok(),
        };
        if !sent {
            tracing::error!("receiver dropped");
        }
    }
}
