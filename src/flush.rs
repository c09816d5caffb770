use std::time::Duration;

use async_trait::async_trait;

/// Awaited by a loader worker after it received the first load request of an execution frame
/// and before it drains the rest of its queue and executes the batch.
///
/// While the trigger is pending, other resolvers get to run and enqueue their own keys. The worker
/// awaits the trigger again whenever new requests arrived during the last wait, and runs the
/// batch once a wait passes with an empty queue. Requests that arrive after that are part of the
/// next frame.
#[async_trait]
pub trait FlushTrigger: Send + Sync + 'static {
    async fn ready(&self);
}

/// Yields to the scheduler `times` times, letting every task that is ready to run enqueue its
/// keys without adding wall-clock latency.
///
/// Suited to a `current_thread` runtime, where resolvers and workers take turns on one thread. On
/// a multi-threaded runtime resolvers may still be running elsewhere when the yields are over;
/// use [`Delay`] there.
#[derive(Debug, Clone, Copy)]
pub struct YieldNow {
    pub times: u32,
}

impl Default for YieldNow {
    fn default() -> Self {
        Self { times: 1 }
    }
}

#[async_trait]
impl FlushTrigger for YieldNow {
    async fn ready(&self) {
        for _ in 0..self.times {
            tokio::task::yield_now().await;
        }
    }
}

/// Waits a fixed amount of time, trading latency for larger batches when resolvers run on
/// several threads. A few milliseconds is usually enough for one level of a resolution tree.
#[derive(Debug, Clone, Copy)]
pub struct Delay(pub Duration);

#[async_trait]
impl FlushTrigger for Delay {
    async fn ready(&self) {
        tokio::time::sleep(self.0).await;
    }
}
