//! Joining position rows with block storage.

use tracing::error;

use crate::model::Transaction;

use super::QueryExecutor;

impl QueryExecutor {
    /// Extracts transactions from one committed block.
    ///
    /// `indices` receives the block's transaction count and names the
    /// in-block positions to take, in the order they should appear;
    /// `pred` filters the selected transactions. A block that cannot be
    /// fetched is logged and skipped, the query degrades to a partial
    /// result instead of failing.
    pub(crate) fn transactions_from_block(
        &self,
        height: u64,
        indices: impl FnOnce(usize) -> Vec<usize>,
        pred: impl Fn(&Transaction) -> bool,
    ) -> Vec<Transaction> {
        let Some(block) = self.block_store.fetch(height) else {
            error!(height, "failed to retrieve block");
            return Vec::new();
        };

        let transactions = block.transactions();
        indices(transactions.len())
            .into_iter()
            .filter_map(|index| transactions.get(index))
            .filter(|tx| pred(tx))
            .cloned()
            .collect()
    }
}
