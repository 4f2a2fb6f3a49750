//! Transaction-listing query handlers.

#![allow(clippy::cast_sign_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::ToSql;

use crate::model::{AccountId, AssetId, Hash};
use crate::permission::Permission;
use crate::query::TxPaginationMeta;
use crate::response::{
    codes, ErrorKind, PendingTransactionsPage, QueryResponse, ResponseBody, TransactionsPage,
};
use crate::storage::PendingError;

use super::pagination::split_lookahead;
use super::rowset::{run_gated, PermColumns};
use super::{perm_sql, QueryExecutor};

/// Start of the page window: the position of the cursor transaction.
const FIRST_BY_HASH_SQL: &str = "SELECT height, \"index\" FROM position_by_hash \
                                 WHERE hash = :first_tx_hash LIMIT 1";

/// Start of the page window: the first committed transaction overall.
const FIRST_EVER_SQL: &str = "SELECT height, \"index\" FROM position_by_hash \
                              ORDER BY height, \"index\" ASC LIMIT 1";

impl QueryExecutor {
    pub(super) fn get_account_transactions(
        &self,
        creator: &AccountId,
        hash: &Hash,
        target: &AccountId,
        pagination: &TxPaginationMeta,
    ) -> QueryResponse {
        const REQUIRED: [Permission; 3] = [
            Permission::GetMyAccountTransactions,
            Permission::GetAllAccountTransactions,
            Permission::GetDomainAccountTransactions,
        ];
        let clause = perm_sql::query_permission_clause(
            creator, target, REQUIRED[0], REQUIRED[1], REQUIRED[2],
        );
        let related_txs = "SELECT DISTINCT height, \"index\" \
                           FROM tx_position_by_creator \
                           WHERE creator_id = :account_id";

        let target_id = target.as_str();
        let first_hash_hex = pagination.first_tx_hash.as_ref().map(Hash::to_hex);
        let window = pagination.page_size as i64 + 1;
        let mut params: Vec<(&str, &dyn ToSql)> = vec![(":account_id", &target_id)];
        if let Some(hex) = &first_hash_hex {
            params.push((":first_tx_hash", hex));
        }
        params.push((":page_size", &window));

        self.transactions_window(
            hash,
            &clause,
            related_txs,
            &params,
            first_hash_hex.as_deref(),
            pagination.page_size,
            &REQUIRED,
            |this| {
                if this.exists_in_db("account", "account_id", "quorum", target.as_str())? {
                    Ok(None)
                } else {
                    Ok(Some((
                        codes::NO_ACCOUNT,
                        format!("no account with such id found: {target}"),
                    )))
                }
            },
        )
    }

    pub(super) fn get_account_asset_transactions(
        &self,
        creator: &AccountId,
        hash: &Hash,
        target: &AccountId,
        asset: &AssetId,
        pagination: &TxPaginationMeta,
    ) -> QueryResponse {
        const REQUIRED: [Permission; 3] = [
            Permission::GetMyAccountAssetTransactions,
            Permission::GetAllAccountAssetTransactions,
            Permission::GetDomainAccountAssetTransactions,
        ];
        let clause = perm_sql::query_permission_clause(
            creator, target, REQUIRED[0], REQUIRED[1], REQUIRED[2],
        );
        let related_txs = "SELECT DISTINCT height, \"index\" \
                           FROM position_by_account_asset \
                           WHERE account_id = :account_id AND asset_id = :asset_id";

        let target_id = target.as_str();
        let asset_id = asset.as_str();
        let first_hash_hex = pagination.first_tx_hash.as_ref().map(Hash::to_hex);
        let window = pagination.page_size as i64 + 1;
        let mut params: Vec<(&str, &dyn ToSql)> = vec![
            (":account_id", &target_id),
            (":asset_id", &asset_id),
        ];
        if let Some(hex) = &first_hash_hex {
            params.push((":first_tx_hash", hex));
        }
        params.push((":page_size", &window));

        self.transactions_window(
            hash,
            &clause,
            related_txs,
            &params,
            first_hash_hex.as_deref(),
            pagination.page_size,
            &REQUIRED,
            |this| {
                if !this.exists_in_db("account", "account_id", "quorum", target.as_str())? {
                    return Ok(Some((
                        codes::NO_ACCOUNT,
                        format!("no account with such id found: {target}"),
                    )));
                }
                if !this.exists_in_db("asset", "asset_id", "precision", asset.as_str())? {
                    return Ok(Some((
                        codes::NO_ASSET,
                        format!("no asset with such id found: {asset}"),
                    )));
                }
                Ok(None)
            },
        )
    }

    /// Shared plan of the paginated transaction-list queries.
    ///
    /// `related_txs` is the data expression producing the `(height,
    /// "index")` positions matching the query; the window seeks to the
    /// cursor position (or the first transaction ever), takes one row
    /// past the page size, and the excess row becomes the next cursor.
    #[allow(clippy::too_many_arguments)]
    fn transactions_window(
        &self,
        hash: &Hash,
        perm_clause: &str,
        related_txs: &str,
        params: &[(&str, &dyn ToSql)],
        first_hash_hex: Option<&str>,
        page_size: u64,
        required: &[Permission; 3],
        fallback_check: impl FnOnce(&Self) -> rusqlite::Result<Option<(u32, String)>>,
    ) -> QueryResponse {
        let first_sql = if first_hash_hex.is_some() {
            FIRST_BY_HASH_SQL
        } else {
            FIRST_EVER_SQL
        };
        let sql = format!(
            "WITH has_perms AS ({perm_clause}),\n\
             my_txs AS ({related_txs}),\n\
             first_hash AS ({first_sql}),\n\
             total_size AS (SELECT count(*) AS total FROM my_txs),\n\
             t AS (\n\
                 SELECT my_txs.height AS height, my_txs.\"index\" AS idx\n\
                 FROM my_txs\n\
                 JOIN first_hash ON my_txs.height > first_hash.height\n\
                     OR (my_txs.height = first_hash.height\n\
                         AND my_txs.\"index\" >= first_hash.\"index\")\n\
                 ORDER BY my_txs.height, my_txs.\"index\"\n\
                 LIMIT :page_size\n\
             )\n\
             SELECT t.height, t.idx, total_size.total, has_perms.perm\n\
             FROM t\n\
             RIGHT OUTER JOIN has_perms ON TRUE\n\
             JOIN total_size ON TRUE\n\
             ORDER BY t.height, t.idx"
        );

        let gated = match run_gated::<_, bool>(&self.conn, &sql, params, 3, |row| {
            let height: Option<i64> = row.get(0)?;
            let index: Option<i64> = row.get(1)?;
            let total: Option<i64> = row.get(2)?;
            Ok(match (height, index, total) {
                (Some(h), Some(i), Some(t)) => Some((h, i, t)),
                _ => None,
            })
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(required, hash);
        }

        let total = gated.rows.first().map_or(0, |row| row.2 as u64);
        let mut positions: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (height, index, _) in &gated.rows {
            positions
                .entry(*height as u64)
                .or_default()
                .push(*index as usize);
        }

        let mut transactions = Vec::with_capacity(gated.rows.len());
        for (height, indices) in positions {
            transactions.extend(self.transactions_from_block(height, |_| indices, |_| true));
        }

        if transactions.is_empty() {
            if let Some(hex) = first_hash_hex {
                // A resolvable cursor always yields at least the cursor
                // transaction itself.
                return self.log_and_error(
                    ErrorKind::StatefulFailed,
                    &format!("invalid pagination hash: {hex}"),
                    codes::BAD_CURSOR,
                    hash,
                );
            }
            match fallback_check(self) {
                Ok(Some((code, message))) => {
                    return self.log_and_error(ErrorKind::StatefulFailed, &message, code, hash)
                }
                Ok(None) => {}
                Err(e) => return self.internal_error(e, hash),
            }
        }

        let (transactions, next_tx_hash) =
            split_lookahead(transactions, page_size as usize, |tx| tx.hash.clone());

        QueryResponse::new(
            hash.clone(),
            ResponseBody::TransactionsPage(TransactionsPage {
                transactions,
                total,
                next_tx_hash,
            }),
        )
    }

    pub(super) fn get_transactions(
        &self,
        creator: &AccountId,
        hash: &Hash,
        tx_hashes: &[Hash],
    ) -> QueryResponse {
        const REQUIRED: [Permission; 2] =
            [Permission::GetMyTransactions, Permission::GetAllTransactions];

        if tx_hashes.is_empty() {
            return self.log_and_error(
                ErrorKind::StatefulFailed,
                "empty transaction hash list",
                codes::BAD_CURSOR,
                hash,
            );
        }

        // Hex renderings come from Hash values, so quoting them as SQL
        // literals is safe; the set also folds duplicate hashes.
        let requested: BTreeSet<String> = tx_hashes.iter().map(Hash::to_hex).collect();
        let in_list = requested
            .iter()
            .map(|hex| format!("'{hex}'"))
            .collect::<Vec<_>>()
            .join(", ");

        let my_check =
            perm_sql::role_permission_check_sql(Permission::GetMyTransactions, ":account_id");
        let all_check =
            perm_sql::role_permission_check_sql(Permission::GetAllTransactions, ":account_id");
        let sql = format!(
            "WITH has_my_perm AS ({my_check}),\n\
             has_all_perm AS ({all_check}),\n\
             t AS (\n\
                 SELECT height, hash FROM position_by_hash WHERE hash IN ({in_list})\n\
             )\n\
             SELECT t.height, t.hash, has_my_perm.perm AS my_perm, has_all_perm.perm AS all_perm\n\
             FROM t\n\
             RIGHT OUTER JOIN has_my_perm ON TRUE\n\
             RIGHT OUTER JOIN has_all_perm ON TRUE"
        );

        let creator_id = creator.as_str();
        let params: [(&str, &dyn ToSql); 1] = [(":account_id", &creator_id)];
        let gated = match run_gated::<_, (bool, bool)>(&self.conn, &sql, &params, 2, |row| {
            let height: Option<i64> = row.get(0)?;
            let tx_hash: Option<String> = row.get(1)?;
            Ok(match (height, tx_hash) {
                (Some(height), Some(tx_hash)) => Some((height, tx_hash)),
                _ => None,
            })
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms.any() {
            return self.permission_denied(&REQUIRED, hash);
        }
        if gated.rows.len() != requested.len() {
            return self.log_and_error(
                ErrorKind::StatefulFailed,
                "at least one of the supplied hashes is incorrect",
                codes::BAD_CURSOR,
                hash,
            );
        }

        let (my_perm, all_perm) = gated.perms;
        let mut by_height: BTreeMap<u64, BTreeSet<String>> = BTreeMap::new();
        for (height, tx_hash) in gated.rows {
            by_height.entry(height as u64).or_default().insert(tx_hash);
        }

        let mut transactions = Vec::new();
        for (height, hashes) in by_height {
            transactions.extend(self.transactions_from_block(
                height,
                |len| (0..len).collect(),
                |tx| {
                    hashes.contains(&tx.hash.to_hex())
                        && (all_perm || (my_perm && tx.creator_account_id == *creator))
                },
            ));
        }

        QueryResponse::new(hash.clone(), ResponseBody::Transactions(transactions))
    }

    pub(super) fn get_pending_transactions(
        &self,
        creator: &AccountId,
        hash: &Hash,
        pagination: Option<&TxPaginationMeta>,
    ) -> QueryResponse {
        let Some(pagination) = pagination else {
            // Deprecated unpaginated form.
            let transactions = self.pending_store.pending_transactions(creator);
            return QueryResponse::new(hash.clone(), ResponseBody::Transactions(transactions));
        };

        match self.pending_store.pending_page(
            creator,
            pagination.page_size,
            pagination.first_tx_hash.as_ref(),
        ) {
            Ok(page) => QueryResponse::new(
                hash.clone(),
                ResponseBody::PendingTransactionsPage(PendingTransactionsPage {
                    transactions: page.transactions,
                    all_transactions_size: page.all_transactions_size,
                    next_batch_info: page.next_batch_info,
                }),
            ),
            Err(PendingError::NotFound) => {
                let cursor = pagination
                    .first_tx_hash
                    .as_ref()
                    .map_or_else(|| "<none>".to_string(), Hash::to_hex);
                self.log_and_error(
                    ErrorKind::StatefulFailed,
                    &format!(
                        "the batch with the specified first transaction hash was not found, \
                         the hash: {cursor}"
                    ),
                    codes::BAD_CURSOR,
                    hash,
                )
            }
        }
    }
}
