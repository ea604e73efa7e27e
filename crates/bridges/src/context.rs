//! Per-bridge key/value state with snapshot history.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Ordered key/value mapping backing a context snapshot.
pub type ContextMap = IndexMap<String, Value>;

/// Mutable key/value state owned by one bridge (or one instance), with an
/// ordered history of immutable snapshots.
///
/// Every mutating operation appends a full copy of the resulting mapping to
/// the history, so `history()[i]` is the state as it existed after the i-th
/// mutation. Lookups never record snapshots. [`Context::restore`] is
/// destructive: later snapshots are discarded, not kept as a branch.
#[derive(Debug, Clone, Default)]
pub struct Context {
    current: ContextMap,
    history: Vec<ContextMap>,
}

impl Context {
    /// Create an empty context with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value` and snapshot the resulting state.
    pub fn update(&mut self, key: impl Into<String>, value: Value) {
        self.current.insert(key.into(), value);
        self.history.push(self.current.clone());
    }

    /// Reset the current mapping to empty and snapshot the empty state.
    pub fn clear(&mut self) {
        self.current.clear();
        self.history.push(self.current.clone());
    }

    /// Restore the context to the snapshot at `index`.
    ///
    /// Truncates history to `index + 1` entries and sets the current mapping
    /// to a copy of that snapshot, so later mutation cannot retroactively
    /// alter it. Fails with [`BridgeError::RangeError`] for an out-of-range
    /// index, leaving history unmodified.
    pub fn restore(&mut self, index: usize) -> Result<()> {
        if index >= self.history.len() {
            return Err(BridgeError::RangeError {
                index,
                len: self.history.len(),
            });
        }
        self.history.truncate(index + 1);
        self.current = self.history[index].clone();
        Ok(())
    }

    /// Current value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    /// The current mapping, in insertion order.
    pub fn current(&self) -> &ContextMap {
        &self.current
    }

    /// All snapshots in the order they were taken.
    pub fn history(&self) -> &[ContextMap] {
        &self.history
    }
}
