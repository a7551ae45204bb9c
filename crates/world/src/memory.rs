use std::cell::Cell;
use std::collections::HashMap;

use cloudaudit_core::{BlockDescriptor, WorldPos};

use crate::oracle::{BlockOracle, OracleError};

/// Sparse in-memory world. Unset coordinates read as air.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    blocks: HashMap<WorldPos, BlockDescriptor>,
    queries: Cell<usize>,
}

impl MemoryWorld {
    /// Empty world (all air).
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a block, replacing whatever was there.
    pub fn set(&mut self, pos: WorldPos, block: BlockDescriptor) {
        self.blocks.insert(pos, block);
    }

    /// Remove a block, leaving air.
    pub fn clear(&mut self, pos: WorldPos) {
        self.blocks.remove(&pos);
    }

    /// Block at `pos` without counting a query.
    pub fn get(&self, pos: WorldPos) -> Option<&BlockDescriptor> {
        self.blocks.get(&pos)
    }

    /// Mutable access to a placed block.
    pub fn get_mut(&mut self, pos: WorldPos) -> Option<&mut BlockDescriptor> {
        self.blocks.get_mut(&pos)
    }

    /// Number of non-air blocks placed.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true when nothing has been placed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of [`BlockOracle::block_at`] calls answered so far.
    pub fn queries(&self) -> usize {
        self.queries.get()
    }

    /// Reset the query counter.
    pub fn reset_queries(&self) {
        self.queries.set(0);
    }
}

impl BlockOracle for MemoryWorld {
    fn block_at(&self, pos: WorldPos) -> Result<BlockDescriptor, OracleError> {
        self.queries.set(self.queries.get() + 1);
        Ok(self
            .blocks
            .get(&pos)
            .cloned()
            .unwrap_or_else(BlockDescriptor::air))
    }
}
