use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};

use crate::{base::RiptideResult, config::EngineConfig, shard::ShardState};

/// A unit of work executed on a shard's own task, against its state.
type ShardJob = Box<dyn FnOnce(&mut ShardState) + Send + 'static>;

/// Owns every shard task and is the only way to reach shard-local state.
///
/// Each shard runs as one task that drains a job channel in arrival order, so
/// shard state needs no locking at all. Replies travel back over per-job
/// oneshot channels.
pub struct ShardSet {
    senders: Vec<mpsc::UnboundedSender<ShardJob>>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    /// This is `true`, when [`shutdown`] has been called.
    ///
    /// [`shutdown`]: Self::shutdown
    is_shutdown: bool,
}

impl ShardSet {
    /// Spawns one task per configured shard. Must run inside a tokio runtime.
    pub async fn init(config: &EngineConfig) -> Self {
        let shard_count = config.shard_count.max(1);
        let mut senders = Vec::with_capacity(shard_count as usize);
        let mut handles = Vec::with_capacity(shard_count as usize);

        for id in 0..shard_count {
            let (tx, mut rx) = mpsc::unbounded_channel::<ShardJob>();
            let scan_buckets = config.scan_buckets;
            let handle = tokio::task::spawn(async move {
                let mut state = ShardState::new(id, scan_buckets);
                while let Some(job) = rx.recv().await {
                    job(&mut state);
                }
                trace!(shard = id, "Shard task drained");
            });
            senders.push(tx);
            handles.push(handle);
        }

        info!(shard_count, "Initialized shard set");
        Self {
            senders,
            handles,
            is_shutdown: false,
        }
    }

    pub fn size(&self) -> usize {
        self.senders.len()
    }

    /// Runs `work` on every shard and suspends until **all** shards completed.
    ///
    /// This is a full barrier: no partial results are observable earlier, and
    /// there is no early exit on first failure. Every shard runs to completion
    /// even if one records an error on a shared [`OperationContext`]. There is
    /// also no built-in timeout; a stuck shard stalls the call indefinitely
    /// unless shard-local code polls a shared [`Cancellation`] itself.
    ///
    /// [`OperationContext`]: crate::ctrl::OperationContext
    /// [`Cancellation`]: crate::ctrl::Cancellation
    pub async fn broadcast<R, F>(&self, work: F) -> Vec<R>
    where
        F: Fn(&mut ShardState) -> R + Clone + Send + 'static,
        R: Send + 'static,
    {
        let mut replies = Vec::with_capacity(self.senders.len());
        for sender in &self.senders {
            let work = work.clone();
            let (tx, rx) = oneshot::channel();
            sender
                .send(Box::new(move |state| {
                    let _ = tx.send(work(state));
                }))
                .expect("Shard channel should not be closed");
            replies.push(rx);
        }

        join_all(replies)
            .await
            .into_iter()
            .map(|reply| reply.expect("Shard task should not drop a reply"))
            .collect()
    }

    /// Runs `work` on the shard selected by `selector` and awaits its reply.
    ///
    /// Out-of-range selectors are normalized modulo the shard count rather than
    /// rejected; with 4 shards, selector 7 lands on shard 3 and selector 4 on
    /// shard 0.
    pub async fn run_on<R, F>(&self, selector: u32, work: F) -> R
    where
        F: FnOnce(&mut ShardState) -> R + Send + 'static,
        R: Send + 'static,
    {
        let sid = selector as usize % self.senders.len();
        let (tx, rx) = oneshot::channel();
        self.senders[sid]
            .send(Box::new(move |state| {
                let _ = tx.send(work(state));
            }))
            .expect("Shard channel should not be closed");
        rx.await.expect("Shard task should not drop a reply")
    }

    /// Closes every job channel and joins every shard task. Jobs already queued
    /// still run before a task exits.
    pub async fn shutdown(&mut self) -> RiptideResult<()> {
        assert!(!self.is_shutdown);

        self.senders.clear();
        for handle in self.handles.drain(..) {
            handle.await?;
        }

        self.is_shutdown = true;
        Ok(())
    }
}

impl Drop for ShardSet {
    fn drop(&mut self) {
        assert!(self.is_shutdown, "ShardSet was not shut down correctly!");
    }
}
