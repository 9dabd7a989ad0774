/// Configuration for the engine and its shard set.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of shards, conceptually one per CPU.
    pub shard_count: u16,
    /// Hash partitions per shard; also the resume granularity of scans.
    pub scan_buckets: usize,
    /// Upper bound for data memory in bytes. Zero means unlimited.
    pub max_memory_limit: u64,
    /// Host kernel version, `5.11` encoded as `511`. Zero when unknown.
    pub kernel_version: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shard_count: std::thread::available_parallelism()
                .map(|n| n.get() as u16)
                .unwrap_or(1),
            scan_buckets: 64,
            max_memory_limit: 0,
            kernel_version: 0,
        }
    }
}

impl EngineConfig {
    /// A config tuned for fast testing.
    ///
    /// - **shards:** A fixed small count keeps fan-out assertions deterministic.
    /// - **buckets:** Few buckets force multi-step scans with tiny keyspaces.
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            shard_count: 4,
            scan_buckets: 8,
            ..Default::default()
        }
    }
}
