//! # Operation Control
//!
//! This module contains the coordination primitives shared by multi-shard operations:
//!
//! - [`Cancellation`]: A cooperative, polled stop flag. It never preempts anything by
//!   itself; long-running shard loops have to check it at iteration boundaries.
//! - [`FirstValue`]: A thread-safe latch that captures the first non-default value
//!   offered to it, used to surface exactly one error out of a fan-out.
//! - [`OpError`]: One failure as an immutable status/details pair.
//! - [`OperationContext`]: Combines the above with an optional accept/ignore policy,
//!   so a multi-shard operation can declare some failures expected.

pub mod context;

pub use context::*;
