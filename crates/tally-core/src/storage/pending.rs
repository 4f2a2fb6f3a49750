//! Pending (mempool) transaction storage seam.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AccountId, Hash, Transaction};

/// Where the next pending page starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    /// Hash of the first transaction of the next page.
    pub first_tx_hash: Hash,

    /// Number of transactions remaining from that point.
    pub batch_size: u64,
}

/// One page of pending transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPage {
    /// Transactions on this page, in arrival order.
    pub transactions: Vec<Transaction>,

    /// Number of pending transactions for the account, all pages.
    pub all_transactions_size: u64,

    /// Where the next page starts, if any.
    pub next_batch_info: Option<BatchInfo>,
}

/// Error returned by a paginated pending read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PendingError {
    /// The supplied first-transaction hash is not pending for the account.
    #[error("no pending transaction batch starts at the given hash")]
    NotFound,
}

/// Read access to the pending transaction pool.
///
/// The pool is mutated by the ordering pipeline; implementations must
/// tolerate concurrent writers. The executor only reads.
pub trait PendingTransactionStore: Send + Sync {
    /// All pending transactions of an account. Deprecated, unpaginated
    /// form kept for old clients.
    fn pending_transactions(&self, account: &AccountId) -> Vec<Transaction>;

    /// One page of an account's pending transactions.
    ///
    /// # Errors
    ///
    /// Returns [`PendingError::NotFound`] if `first_tx_hash` is given but
    /// no pending transaction of the account carries that hash.
    fn pending_page(
        &self,
        account: &AccountId,
        page_size: u64,
        first_tx_hash: Option<&Hash>,
    ) -> Result<PendingPage, PendingError>;
}

/// In-memory pending pool.
#[derive(Debug, Default)]
pub struct InMemoryPendingStore {
    by_account: RwLock<HashMap<AccountId, Vec<Transaction>>>,
}

impl InMemoryPendingStore {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pending transaction, keyed by its creator.
    pub fn insert(&self, tx: Transaction) {
        let mut by_account = self.by_account.write().expect("pending store lock poisoned");
        by_account
            .entry(tx.creator_account_id.clone())
            .or_default()
            .push(tx);
    }

    /// Drops every pending transaction of an account.
    pub fn remove_account(&self, account: &AccountId) {
        let mut by_account = self.by_account.write().expect("pending store lock poisoned");
        by_account.remove(account);
    }
}

impl PendingTransactionStore for InMemoryPendingStore {
    fn pending_transactions(&self, account: &AccountId) -> Vec<Transaction> {
        let by_account = self.by_account.read().expect("pending store lock poisoned");
        by_account.get(account).cloned().unwrap_or_default()
    }

    fn pending_page(
        &self,
        account: &AccountId,
        page_size: u64,
        first_tx_hash: Option<&Hash>,
    ) -> Result<PendingPage, PendingError> {
        let by_account = self.by_account.read().expect("pending store lock poisoned");
        let all = by_account.get(account).map(Vec::as_slice).unwrap_or(&[]);

        let start = match first_tx_hash {
            Some(hash) => all
                .iter()
                .position(|tx| tx.hash == *hash)
                .ok_or(PendingError::NotFound)?,
            None => 0,
        };

        let page_len = usize::try_from(page_size).unwrap_or(usize::MAX);
        let end = start.saturating_add(page_len).min(all.len());
        let next_batch_info = all.get(end).map(|next| BatchInfo {
            first_tx_hash: next.hash.clone(),
            batch_size: (all.len() - end) as u64,
        });

        Ok(PendingPage {
            transactions: all[start..end].to_vec(),
            all_transactions_size: all.len() as u64,
            next_batch_info,
        })
    }
}
