//! Committed block storage seam.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::model::Block;

/// Error returned by the in-memory block store on a bad append.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockStoreError {
    /// Blocks must be appended in commit order without gaps.
    #[error("non-consecutive block height {height} (expected {expected})")]
    NonConsecutiveHeight {
        /// Height of the rejected block.
        height: u64,
        /// Height the store expected next.
        expected: u64,
    },
}

/// Read access to committed blocks.
///
/// The query executor is a pure reader: it never appends. `fetch` may
/// return `None` for a height within range if the underlying store lost
/// or cannot deserialize the block; callers treat that as a gap, not a
/// hard failure.
pub trait BlockStorage: Send + Sync {
    /// Current committed height; 0 for an empty ledger.
    fn size(&self) -> u64;

    /// One committed block; heights are 1-indexed.
    fn fetch(&self, height: u64) -> Option<Arc<Block>>;
}

/// In-memory block store.
///
/// Backs tests and small embeddings; a durable engine implements
/// [`BlockStorage`] elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryBlockStorage {
    blocks: RwLock<Vec<Arc<Block>>>,
}

impl InMemoryBlockStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next committed block.
    ///
    /// # Errors
    ///
    /// Returns [`BlockStoreError::NonConsecutiveHeight`] unless
    /// `block.height` is exactly the current size plus one.
    pub fn append(&self, block: Block) -> Result<(), BlockStoreError> {
        let mut blocks = self.blocks.write().expect("block store lock poisoned");
        let expected = blocks.len() as u64 + 1;
        if block.height != expected {
            return Err(BlockStoreError::NonConsecutiveHeight {
                height: block.height,
                expected,
            });
        }
        blocks.push(Arc::new(block));
        Ok(())
    }
}

impl BlockStorage for InMemoryBlockStorage {
    fn size(&self) -> u64 {
        self.blocks.read().expect("block store lock poisoned").len() as u64
    }

    fn fetch(&self, height: u64) -> Option<Arc<Block>> {
        if height == 0 {
            return None;
        }
        let blocks = self.blocks.read().expect("block store lock poisoned");
        blocks.get(usize::try_from(height).ok()? - 1).cloned()
    }
}
