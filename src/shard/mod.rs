//! # Shards
//!
//! Each shard is an independently executing partition owning a slice of the
//! keyspace and its own memory arena. Shard-local state is only ever touched by
//! the shard's own task; everything cross-shard goes through [`ShardSet`].
//!
//! The keyspace slice is partitioned into hash buckets, which double as the
//! resume granularity for cursor-based scans: a scan step emits whole buckets
//! and hands back the index of the next unvisited bucket as its cursor.

use bytes::Bytes;
use xxhash_rust::xxh3::xxh3_64;

use crate::{
    base::{utils::PrettyBytes, ObjType, ShardId},
    scan::{BucketId, ScanFilter},
};

mod arena;
mod set;

pub use arena::{BlockInfo, BlockKey, BlockMap, MemoryReport, MemoryTotals, ShardArena};
pub use set::ShardSet;

/// Result of one shard-local scan step.
#[derive(Debug)]
pub struct ScanResult {
    /// Matched names, in bucket order.
    pub names: Vec<Bytes>,
    /// Where to resume. `None` means the scan completed.
    pub cursor: Option<BucketId>,
}

/// The state owned by one shard's task.
#[derive(Debug)]
pub struct ShardState {
    id: ShardId,
    /// Hash partitions of this shard's keyspace slice. The storage map proper
    /// lives behind another boundary; entries here carry what iteration needs.
    buckets: Vec<Vec<(Bytes, ObjType)>>,
    arena: ShardArena,
}

impl ShardState {
    pub(crate) fn new(id: ShardId, scan_buckets: usize) -> Self {
        debug_assert!(scan_buckets > 0);
        Self {
            id,
            buckets: vec![Vec::new(); scan_buckets],
            arena: ShardArena::default(),
        }
    }

    pub fn id(&self) -> ShardId {
        self.id
    }

    pub fn arena(&self) -> &ShardArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ShardArena {
        &mut self.arena
    }

    fn bucket_of(&self, name: &[u8]) -> usize {
        (xxh3_64(name) % self.buckets.len() as u64) as usize
    }

    pub fn insert(&mut self, name: Bytes, obj_type: ObjType) {
        let bucket = self.bucket_of(&name);
        trace!(key = ?PrettyBytes(&name), ty = obj_type.name(), bucket, "Inserting key");
        if let Some(entry) = self.buckets[bucket].iter_mut().find(|(n, _)| *n == name) {
            entry.1 = obj_type;
            return;
        }
        self.buckets[bucket].push((name, obj_type));
    }

    pub fn remove(&mut self, name: &[u8]) -> bool {
        let bucket = self.bucket_of(name);
        let entries = &mut self.buckets[bucket];
        let before = entries.len();
        entries.retain(|(n, _)| n.as_ref() != name);
        before != entries.len()
    }

    pub fn key_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// One cursor-resumable scan step over this shard's keyspace.
    ///
    /// Buckets are emitted whole, starting at the filter's resume bucket (or the
    /// first one when unrestricted). Once at least `limit` names have been
    /// collected the step stops at the next bucket boundary and returns that
    /// bucket as the continuation cursor.
    pub fn scan(&self, filter: &ScanFilter) -> ScanResult {
        let start = filter.bucket.map(|b| b.get() as usize).unwrap_or(0);

        let mut names = Vec::new();
        let mut next = start;
        while next < self.buckets.len() {
            for (name, obj_type) in &self.buckets[next] {
                if let Some(wanted) = filter.type_filter {
                    if *obj_type != wanted {
                        continue;
                    }
                }
                if filter.matches(name) {
                    names.push(name.clone());
                }
            }
            next += 1;
            if names.len() >= filter.limit {
                break;
            }
        }

        let cursor = (next < self.buckets.len())
            .then(|| BucketId::new(next as u32))
            .flatten();
        trace!(
            shard = self.id,
            matched = names.len(),
            ?cursor,
            "Scan step finished"
        );
        ScanResult { names, cursor }
    }
}
