//! Per-shard replicated state.
//!
//! Every shard owns one instance of `T` inside its own task and mutates it
//! only in response to jobs sent over that shard's channel, so no lock is held
//! around `T`. Callers address shards by index and get results back over a
//! oneshot channel.

use futures_util::future::join_all;
use tokio::sync::{mpsc, oneshot};

/// Index of an execution shard.
pub type ShardId = usize;

type Job<T> = Box<dyn FnOnce(&mut T) + Send>;

/// Handle to `count` independently owned instances of `T`.
pub struct Sharded<T> {
    shards: Vec<mpsc::UnboundedSender<Job<T>>>,
}

impl<T> Clone for Sharded<T> {
    fn clone(&self) -> Self {
        Self {
            shards: self.shards.clone(),
        }
    }
}

impl<T: Send + 'static> Sharded<T> {
    /// Spawn one owner task per shard. Must be called inside a tokio runtime.
    pub fn start(count: usize, mut factory: impl FnMut(ShardId) -> T) -> Self {
        let count = count.max(1);
        let mut shards = Vec::with_capacity(count);
        for shard in 0..count {
            let (tx, mut rx) = mpsc::unbounded_channel::<Job<T>>();
            let mut local = factory(shard);
            tokio::spawn(async move {
                // Jobs run in arrival order against the shard-local instance.
                while let Some(job) = rx.recv().await {
                    job(&mut local);
                }
                tracing::debug!(shard, "shard worker stopped");
            });
            shards.push(tx);
        }
        Self { shards }
    }

    pub fn count(&self) -> usize {
        self.shards.len()
    }

    /// Run `f` against `shard`'s instance and return its result.
    pub async fn invoke_on<R, F>(&self, shard: ShardId, f: F) -> anyhow::Result<R>
    where
        F: FnOnce(&mut T) -> R + Send + 'static,
        R: Send + 'static,
    {
        let tx = self.shards.get(shard).ok_or_else(|| {
            anyhow::anyhow!("shard {shard} out of range ({} shards)", self.shards.len())
        })?;
        let (resp_tx, resp_rx) = oneshot::channel();
        let job: Job<T> = Box::new(move |local: &mut T| {
            let _ = resp_tx.send(f(local));
        });
        tx.send(job)
            .map_err(|_| anyhow::anyhow!("shard {shard} worker is not running"))?;
        resp_rx
            .await
            .map_err(|_| anyhow::anyhow!("shard {shard} worker dropped the request"))
    }

    /// Run `f` on every shard concurrently; results are in shard order.
    pub async fn invoke_on_all<R, F>(&self, f: F) -> anyhow::Result<Vec<R>>
    where
        F: Fn(&mut T) -> R + Clone + Send + 'static,
        R: Send + 'static,
    {
        let calls = (0..self.shards.len()).map(|shard| {
            let f = f.clone();
            self.invoke_on(shard, move |local: &mut T| f(local))
        });
        join_all(calls).await.into_iter().collect()
    }
}
