//! Storage seams of the read side.
//!
//! The executor crosses two stores besides its own database session: the
//! committed block store (a log keyed by height) and the pending
//! transaction pool. Both are defined as traits here, with in-memory
//! implementations for tests and small embeddings.
//!
//! [`schema`] additionally carries the ledger-state DDL and the per-session
//! SQL function registration the query plans depend on.

mod block_store;
mod pending;
pub mod schema;

pub use block_store::{BlockStorage, BlockStoreError, InMemoryBlockStorage};
pub use pending::{
    BatchInfo, InMemoryPendingStore, PendingError, PendingPage, PendingTransactionStore,
};
