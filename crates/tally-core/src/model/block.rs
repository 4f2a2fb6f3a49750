//! Committed blocks and the transactions they carry.

use serde::{Deserialize, Serialize};

use super::hash::Hash;
use super::ids::AccountId;

/// A committed transaction.
///
/// The executor treats transaction contents as opaque: it needs the hash
/// for identity and pagination cursors, and the creator for the
/// "my transactions" permission checks. The payload travels along
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content hash identifying this transaction.
    pub hash: Hash,

    /// Account that signed and submitted the transaction.
    pub creator_account_id: AccountId,

    /// Opaque transaction body.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Transaction {
    /// Creates a transaction with an empty payload.
    #[must_use]
    pub fn new(hash: Hash, creator_account_id: AccountId) -> Self {
        Self {
            hash,
            creator_account_id,
            payload: serde_json::Value::Null,
        }
    }
}

/// A committed block.
///
/// Blocks are 1-indexed by commit order; `height` of the first block is 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position of this block in the chain, starting at 1.
    pub height: u64,

    /// Transactions in commit order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a block at the given height.
    #[must_use]
    pub fn new(height: u64, transactions: Vec<Transaction>) -> Self {
        Self {
            height,
            transactions,
        }
    }

    /// Transactions in commit order, indexable by in-block position.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}
