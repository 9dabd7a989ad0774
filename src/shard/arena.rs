use std::collections::HashMap;

/// One live allocation as reported by the shard's allocator.
///
/// `reserved` and `committed` describe the arena area the block lives in,
/// `used` the bytes actually occupied. All figures are per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub block_size: u64,
    pub reserved: u64,
    pub committed: u64,
    pub used: u64,
}

/// Block shape: `(block_size, reserved, committed, used)`.
pub type BlockKey = (u64, u64, u64, u64);

/// Histogram of live blocks, keyed by shape.
pub type BlockMap = HashMap<BlockKey, u64>;

impl BlockInfo {
    pub const fn key(&self) -> BlockKey {
        (self.block_size, self.reserved, self.committed, self.used)
    }
}

/// The introspection boundary to one shard's allocator.
///
/// The allocator feeds its live-block bookkeeping in through [`record`]; reports
/// walk it through [`visit_blocks`]. Visitation is infallible: there is no failure
/// path for an individual block visit.
///
/// [`record`]: Self::record
/// [`visit_blocks`]: Self::visit_blocks
#[derive(Debug, Default)]
pub struct ShardArena {
    blocks: Vec<BlockInfo>,
}

impl ShardArena {
    pub fn record(&mut self, block: BlockInfo) {
        self.blocks.push(block);
    }

    pub fn visit_blocks<F: FnMut(&BlockInfo)>(&self, mut visit: F) {
        for block in &self.blocks {
            visit(block);
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Opaque allocator-statistics blob for text reports.
    pub fn stats_summary(&self) -> String {
        let mut reserved = 0u64;
        let mut used = 0u64;
        self.visit_blocks(|block| {
            reserved += block.reserved;
            used += block.used;
        });
        format!(
            "arena: {} live blocks, {} bytes reserved, {} bytes used\n",
            self.blocks.len(),
            reserved,
            used,
        )
    }
}

/// Keyed histogram over one or more shards' live blocks.
///
/// Merging is commutative and associative: folding any number of per-shard
/// reports in any order produces the same result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryReport {
    blocks: BlockMap,
}

/// Byte totals derived from a [`MemoryReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryTotals {
    pub reserved: u64,
    pub committed: u64,
    pub used: u64,
}

impl MemoryReport {
    /// Classifies every live block of `arena` by shape.
    pub fn from_arena(arena: &ShardArena) -> Self {
        let mut blocks = BlockMap::new();
        arena.visit_blocks(|block| {
            *blocks.entry(block.key()).or_default() += 1;
        });
        Self { blocks }
    }

    /// Unions `other` into this report, summing counts per shape.
    pub fn merge(&mut self, other: &MemoryReport) {
        for (key, count) in &other.blocks {
            *self.blocks.entry(*key).or_default() += count;
        }
    }

    pub fn blocks(&self) -> &BlockMap {
        &self.blocks
    }

    /// Sums each shape's per-block figures weighted by its count.
    pub fn totals(&self) -> MemoryTotals {
        let mut totals = MemoryTotals::default();
        for ((_block_size, reserved, committed, used), count) in &self.blocks {
            totals.reserved += count * reserved;
            totals.committed += count * committed;
            totals.used += count * used;
        }
        totals
    }
}
