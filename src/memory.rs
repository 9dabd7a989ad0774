//! # Memory Introspection
//!
//! The administrative `MEMORY` command family. `USAGE` answers a placeholder
//! integer; `MALLOC-STATS` walks shard arenas (one shard when a selector is
//! given, all shards merged otherwise) and renders a text report with a block
//! shape histogram, byte totals and an elapsed-time footer.

use std::fmt::Write as _;
use std::time::Instant;

use itertools::Itertools;
use tracing::instrument;

use crate::{
    base::{RiptideError, RiptideResult},
    metrics::SystemMetrics,
    shard::{MemoryReport, ShardSet},
};

/// The command family this surface answers for, named in unknown-sub-command errors.
const FAMILY: &str = "MEMORY";

/// Reply of one administrative call: a scalar or a complete text report, never
/// a partial report.
#[derive(Debug, PartialEq, Eq)]
pub enum MemoryResponse {
    Integer(i64),
    Text(String),
}

pub struct MemoryCmd<'a> {
    shards: &'a ShardSet,
    metrics: &'a SystemMetrics,
}

impl<'a> MemoryCmd<'a> {
    pub fn new(shards: &'a ShardSet, metrics: &'a SystemMetrics) -> Self {
        Self { shards, metrics }
    }

    /// Dispatches one sub-command. `args[0]` is the sub-command name, matched
    /// case-insensitively.
    #[instrument(skip_all, level = "debug")]
    pub async fn run(&self, args: &[String]) -> RiptideResult<MemoryResponse> {
        let sub_cmd = args.first().map(String::as_str).unwrap_or("");

        if sub_cmd.eq_ignore_ascii_case("USAGE") {
            // placeholder reply; per-key usage accounting is not implemented
            return Ok(MemoryResponse::Integer(1));
        }

        if sub_cmd.eq_ignore_ascii_case("MALLOC-STATS") {
            let report = match args.get(1) {
                Some(raw) => {
                    let selector: u32 = raw.parse().map_err(|_| RiptideError::InvalidInt)?;
                    self.malloc_stats_one(selector).await
                }
                None => self.malloc_stats_all().await,
            };
            return Ok(MemoryResponse::Text(report));
        }

        Err(RiptideError::UnknownSubCommand {
            cmd: sub_cmd.to_string(),
            family: FAMILY,
        })
    }

    async fn malloc_stats_one(&self, selector: u32) -> String {
        let started = Instant::now();
        let (id, blob, report) = self
            .shards
            .run_on(selector, |state| {
                (
                    state.id(),
                    state.arena().stats_summary(),
                    MemoryReport::from_arena(state.arena()),
                )
            })
            .await;

        self.metrics.update_used(report.totals().used);
        render(&format!("shard: {id}"), &blob, &report, started)
    }

    async fn malloc_stats_all(&self) -> String {
        let started = Instant::now();
        let partials = self
            .shards
            .broadcast(|state| {
                (
                    state.id(),
                    state.arena().stats_summary(),
                    MemoryReport::from_arena(state.arena()),
                )
            })
            .await;

        let mut blob = String::new();
        let mut merged = MemoryReport::default();
        for (id, shard_blob, report) in &partials {
            let _ = write!(blob, "shard {id} {shard_blob}");
            merged.merge(report);
        }

        self.metrics.update_used(merged.totals().used);
        render(
            &format!("all {} shards", partials.len()),
            &blob,
            &merged,
            started,
        )
    }
}

fn render(scope: &str, stats_blob: &str, report: &MemoryReport, started: Instant) -> String {
    let mut out = String::new();
    out.push_str("___ Begin arena statistics ___\n");
    out.push_str(stats_blob);
    let _ = writeln!(out, "\nArena statistics from {scope}");
    out.push_str("Count BlockSize Reserved Committed Used\n");

    for (key, count) in report.blocks().iter().sorted() {
        let (block_size, reserved, committed, used) = key;
        let _ = writeln!(out, "{count} {block_size} {reserved} {committed} {used}");
    }

    let totals = report.totals();
    let elapsed_us = started.elapsed().as_micros();
    let _ = writeln!(out, "--- End arena statistics, took {elapsed_us}us ---");
    let _ = writeln!(
        out,
        "total reserved: {}, committed: {}, used: {}",
        totals.reserved, totals.committed, totals.used
    );
    out
}

#[cfg(test)]
mod tests {
    use crate::{
        config::EngineConfig,
        shard::BlockInfo,
        tests::setup_tracing,
        Engine,
    };

    use super::*;

    fn uniform(size: u64) -> BlockInfo {
        BlockInfo {
            block_size: size,
            reserved: size,
            committed: size,
            used: size,
        }
    }

    async fn seeded_engine() -> Engine {
        let engine = Engine::init(EngineConfig::for_testing()).await;
        engine
            .shards()
            .broadcast(|state| {
                // shard 0 holds three (8,8,8,8) blocks, shard 1 two of them;
                // every shard also holds one shape of its own
                match state.id() {
                    0 => {
                        for _ in 0..3 {
                            state.arena_mut().record(uniform(8));
                        }
                    }
                    1 => {
                        for _ in 0..2 {
                            state.arena_mut().record(uniform(8));
                        }
                    }
                    _ => {}
                }
                let shard_id = state.id() as u64;
                state.arena_mut().record(uniform(64 * (shard_id + 1)));
            })
            .await;
        engine
    }

    fn run_args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_usage_returns_placeholder() {
        setup_tracing();
        let mut engine = Engine::init(EngineConfig::for_testing()).await;
        let response = engine.memory_cmd().run(&run_args(&["usage"])).await.unwrap();
        assert_eq!(response, MemoryResponse::Integer(1));
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_malloc_stats_merges_all_shards() {
        setup_tracing();
        let mut engine = seeded_engine().await;

        let response = engine
            .memory_cmd()
            .run(&run_args(&["malloc-stats"]))
            .await
            .unwrap();
        let MemoryResponse::Text(text) = response else {
            panic!("expected a text report");
        };

        assert!(text.contains("Arena statistics from all 4 shards"));
        assert!(text.contains("Count BlockSize Reserved Committed Used\n"));
        // counts for the shared shape sum across shards: 3 + 2
        assert!(text.contains("\n5 8 8 8 8\n"), "report was: {text}");
        // one row per distinct per-shard shape
        for size in [64, 128, 192, 256] {
            assert!(text.contains(&format!("\n1 {size} {size} {size} {size}\n")));
        }
        // totals: 5*8 + 64 + 128 + 192 + 256 = 680
        assert!(text.contains("total reserved: 680, committed: 680, used: 680"));
        assert!(text.contains("us ---"));

        assert_eq!(engine.metrics().used_peak(), 680);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_malloc_stats_with_selector_reports_one_shard() {
        setup_tracing();
        let mut engine = seeded_engine().await;

        // selector 5 normalizes to shard 1 (two 8-byte blocks plus one 128)
        let response = engine
            .memory_cmd()
            .run(&run_args(&["MALLOC-STATS", "5"]))
            .await
            .unwrap();
        let MemoryResponse::Text(text) = response else {
            panic!("expected a text report");
        };
        assert!(text.contains("Arena statistics from shard: 1"));
        assert!(text.contains("\n2 8 8 8 8\n"));
        assert!(text.contains("total reserved: 144, committed: 144, used: 144"));

        let err = engine
            .memory_cmd()
            .run(&run_args(&["malloc-stats", "abc"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RiptideError::InvalidInt));

        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_sub_command_names_family_and_mutates_nothing() {
        setup_tracing();
        let mut engine = seeded_engine().await;

        let before: usize = engine
            .shards()
            .broadcast(|state| state.arena().block_count())
            .await
            .into_iter()
            .sum();

        let err = engine
            .memory_cmd()
            .run(&run_args(&["doctor"]))
            .await
            .unwrap_err();
        match err {
            RiptideError::UnknownSubCommand { cmd, family } => {
                assert_eq!(cmd, "doctor");
                assert_eq!(family, "MEMORY");
            }
            other => panic!("unexpected error: {other}"),
        }

        let after: usize = engine
            .shards()
            .broadcast(|state| state.arena().block_count())
            .await
            .into_iter()
            .sum();
        assert_eq!(before, after);

        engine.shutdown().await.unwrap();
    }
}
