#[macro_use]
extern crate derive_more;
#[macro_use]
extern crate tracing;

use crate::{
    base::{GlobalState, RiptideResult},
    config::EngineConfig,
    memory::MemoryCmd,
    metrics::SystemMetrics,
    shard::ShardSet,
};

pub mod base;
pub mod config;
pub mod ctrl;
pub mod keys;
pub mod memory;
pub mod metrics;
pub mod scan;
pub mod shard;

/// Riptide engine core. The keyspace is split across independently executing
/// shards, conceptually one per CPU; this type owns their tasks and the
/// process-wide metrics object.
///
/// ## Coordination model
///
/// Cross-shard work goes through [`ShardSet::broadcast`], a full barrier that
/// merges per-shard results only once every shard finished. Failures inside a
/// fan-out travel through a shared [`OperationContext`], which captures the
/// first accepted error and flips a cooperative [`Cancellation`] flag that
/// shard loops poll at iteration boundaries.
///
/// ## Lifecycle
///
/// [`init`] spawns the shard tasks and must run inside a tokio runtime;
/// [`shutdown`] drains and joins them. Dropping an engine that was not shut
/// down is a bug and asserts.
///
/// [`ShardSet::broadcast`]: crate::shard::ShardSet::broadcast
/// [`OperationContext`]: crate::ctrl::OperationContext
/// [`Cancellation`]: crate::ctrl::Cancellation
/// [`init`]: Self::init
/// [`shutdown`]: Self::shutdown
pub struct Engine {
    shards: ShardSet,
    metrics: SystemMetrics,
    state: GlobalState,
}

impl Engine {
    /// Initialize this `Engine` instance.
    pub async fn init(config: EngineConfig) -> Self {
        let shards = ShardSet::init(&config).await;
        let metrics = SystemMetrics::new(config.max_memory_limit, config.kernel_version);
        let state = GlobalState::Active;
        info!(state = %state, shards = shards.size(), "Engine initialized");
        Self {
            shards,
            metrics,
            state,
        }
    }

    pub fn shards(&self) -> &ShardSet {
        &self.shards
    }

    pub fn metrics(&self) -> &SystemMetrics {
        &self.metrics
    }

    pub const fn global_state(&self) -> GlobalState {
        self.state
    }

    /// The administrative memory introspection surface.
    pub fn memory_cmd(&self) -> MemoryCmd<'_> {
        MemoryCmd::new(&self.shards, &self.metrics)
    }

    pub async fn shutdown(&mut self) -> RiptideResult<()> {
        self.state = GlobalState::ShuttingDown;
        info!(state = %self.state, "Engine shutting down");
        self.shards.shutdown().await
    }
}
