use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Storage;
use crate::error::Result;
use crate::population::Population;

/// Keeps a clone of every exported round in memory.
///
/// Clones share their buffer, so a handle kept by the caller observes the
/// exports made by the optimizer.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    rounds: Arc<RwLock<BTreeMap<usize, Population>>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the export of `round`, if any.
    #[must_use]
    pub fn round(&self, round: usize) -> Option<Population> {
        self.rounds.read().get(&round).cloned()
    }

    /// Returns the number of exported rounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rounds.read().len()
    }

    /// Returns `true` if nothing has been exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn export(&self, round: usize, population: &Population) -> Result<()> {
        self.rounds.write().insert(round, population.clone());
        Ok(())
    }
}
