//! Key-position descriptors consumed by the transaction-locking subsystem.
//!
//! A [`KeyIndex`] describes which argument positions of a command are keys; it is
//! defined once per command at startup and read-only thereafter. [`KeyLockArgs`] is
//! the raw material a locking routine walks with such a descriptor. The extraction
//! order here is the single contract the locking subsystem relies on; command
//! implementations never re-derive key positions ad hoc.

use bytes::Bytes;

use crate::base::DbIndex;

/// Describes key argument positions of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyIndex {
    /// If non-zero, adds one extra key position, appended last. Relevant for
    /// commands with an out-of-range destination key.
    pub bonus: u32,
    pub start: u32,
    /// Does not include this index (open limit).
    pub end: u32,
    /// 1 for commands like mget, 2 for commands like mset.
    pub step: u32,
}

impl KeyIndex {
    pub const fn range(start: u32, end: u32, step: u32) -> Self {
        debug_assert!(end >= start);
        debug_assert!(step >= 1);
        Self {
            bonus: 0,
            start,
            end,
            step,
        }
    }

    pub const fn with_bonus(mut self, bonus: u32) -> Self {
        self.bonus = bonus;
        self
    }

    /// Whether the command touches exactly one key and no bonus position. The
    /// locking subsystem uses this to take a fast single-key path that skips
    /// building the full multi-key set.
    pub const fn has_single_key(&self) -> bool {
        self.bonus == 0 && self.start + self.step >= self.end
    }

    pub const fn num_args(&self) -> u32 {
        self.end - self.start + (self.bonus > 0) as u32
    }

    /// Key argument positions in extraction order: `start`, `start + step`, ...
    /// strictly below `end`, then the bonus position last if one is set.
    pub fn positions(self) -> impl Iterator<Item = usize> {
        (self.start as usize..self.end as usize)
            .step_by(self.step as usize)
            .chain((self.bonus != 0).then_some(self.bonus as usize))
    }

    /// The exact ordered key names this descriptor selects from `args`.
    ///
    /// Positions are trusted to be within bounds; descriptors are validated
    /// against the command arity when the command table is built.
    pub fn extract<'a>(&self, args: &'a [Bytes]) -> impl Iterator<Item = &'a Bytes> + 'a {
        self.positions().map(move |pos| &args[pos])
    }
}

/// Raw material for one lock acquisition.
#[derive(Debug, Clone)]
pub struct KeyLockArgs<'a> {
    pub db_index: DbIndex,
    pub args: &'a [Bytes],
    pub key_step: u32,
}

impl KeyLockArgs<'_> {
    /// Collects the ordered key names selected by `index`.
    pub fn lock_keys(&self, index: &KeyIndex) -> Vec<Bytes> {
        index.extract(self.args).cloned().collect()
    }
}
