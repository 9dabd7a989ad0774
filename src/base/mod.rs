//! This module contains base types that are used across Riptide.
//!
//! - [`OpStatus`]: A small status code attached to the outcome of one shard-local operation.
//!   Its default value is [`OpStatus::Ok`], which all first-error aggregation relies on.
//! - [`ObjType`]: The object types a key can hold; scan `TYPE` filtering matches their names.
//! - [`GlobalState`]: The engine lifecycle state, with its wire-visible display names.
//! - [`RiptideError`]: The crate-level error for the administrative surface.

pub mod error;
pub mod utils;

pub use error::*;

/// Identifies one shard within the engine's shard set.
pub type ShardId = u16;

/// Logical database index within the keyspace.
pub type DbIndex = u16;

/// Status of one shard-local operation. The `Ok` default is load-bearing:
/// first-error aggregation treats a default status as "nothing to report".
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OpStatus {
    #[default]
    #[display("OK")]
    Ok,
    #[display("no such key")]
    KeyNotFound,
    #[display("syntax error")]
    SyntaxErr,
    #[display("value is not an integer or out of range")]
    InvalidInt,
    #[display("out of memory")]
    OutOfMemory,
}

impl OpStatus {
    /// Whether this status carries an actual failure.
    pub const fn is_err(&self) -> bool {
        !matches!(self, OpStatus::Ok)
    }
}

pub type OpResult<T> = Result<T, OpStatus>;

/// The object types a key can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjType {
    String,
    List,
    Set,
    ZSet,
    Hash,
    Stream,
}

impl ObjType {
    /// The lowercase name used by scan `TYPE` filters and reports.
    pub const fn name(&self) -> &'static str {
        match self {
            ObjType::String => "string",
            ObjType::List => "list",
            ObjType::Set => "set",
            ObjType::ZSet => "zset",
            ObjType::Hash => "hash",
            ObjType::Stream => "stream",
        }
    }

    /// Inverse of [`name`]. Expects an already lowercased name.
    ///
    /// [`name`]: Self::name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => ObjType::String,
            "list" => ObjType::List,
            "set" => ObjType::Set,
            "zset" => ObjType::ZSet,
            "hash" => ObjType::Hash,
            "stream" => ObjType::Stream,
            _ => return None,
        })
    }
}

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum GlobalState {
    #[strum(serialize = "ACTIVE")]
    Active,
    #[strum(serialize = "LOADING")]
    Loading,
    #[strum(serialize = "SAVING")]
    Saving,
    #[strum(serialize = "SHUTTING DOWN")]
    ShuttingDown,
}
