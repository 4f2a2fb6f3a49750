//! The query dispatcher.
//!
//! [`QueryExecutor`] owns a database session plus handles to the block
//! store and the pending pool, and maps each [`Query`] variant to its
//! relational plan. Gated variants share one protocol: build a statement
//! whose first common table expression is the authorization predicate,
//! decode the gated rowset, refuse with code 2 when every permission flag
//! is false, then hand the complete rows to the variant's assembler.
//! Failures of any kind become error responses; nothing escapes as a
//! panic or an `Err`.

mod account;
mod blocks;
mod pagination;
mod perm_sql;
mod rowset;
mod transactions;
mod world;

use std::fmt::Display;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use tracing::error;

use crate::model::Hash;
use crate::permission::Permission;
use crate::query::{Query, QueryRequest};
use crate::response::{codes, ErrorKind, QueryResponse};
use crate::storage::{schema, BlockStorage, PendingTransactionStore};

/// Executes read-only ledger queries.
///
/// The executor holds its own database session; it never shares it. Run
/// queries concurrently by creating one executor per session. The block
/// store and pending pool handles may be shared freely.
pub struct QueryExecutor {
    conn: Connection,
    block_store: Arc<dyn BlockStorage>,
    pending_store: Arc<dyn PendingTransactionStore>,
}

impl QueryExecutor {
    /// Creates an executor over the given session and collaborator
    /// handles, registering the SQL functions the plans depend on.
    ///
    /// # Errors
    ///
    /// Returns an error if function registration on the session fails.
    pub fn new(
        conn: Connection,
        block_store: Arc<dyn BlockStorage>,
        pending_store: Arc<dyn PendingTransactionStore>,
    ) -> rusqlite::Result<Self> {
        schema::prepare_connection(&conn)?;
        Ok(Self {
            conn,
            block_store,
            pending_store,
        })
    }

    /// Executes one query and returns its typed response.
    ///
    /// Total over all inputs: every failure mode is encoded in the
    /// response body, and the query hash is echoed back either way.
    #[must_use]
    pub fn execute(&self, request: &QueryRequest) -> QueryResponse {
        let creator = &request.creator;
        let hash = &request.hash;
        match &request.payload {
            Query::GetAccount { account_id } => self.get_account(creator, hash, account_id),
            Query::GetBlock { height } => self.get_block(creator, hash, *height),
            Query::GetSignatories { account_id } => {
                self.get_signatories(creator, hash, account_id)
            }
            Query::GetAccountTransactions {
                account_id,
                pagination,
            } => self.get_account_transactions(creator, hash, account_id, pagination),
            Query::GetTransactions { tx_hashes } => {
                self.get_transactions(creator, hash, tx_hashes)
            }
            Query::GetAccountAssetTransactions {
                account_id,
                asset_id,
                pagination,
            } => self.get_account_asset_transactions(
                creator, hash, account_id, asset_id, pagination,
            ),
            Query::GetAccountAssets {
                account_id,
                pagination,
            } => self.get_account_assets(creator, hash, account_id, pagination),
            Query::GetAccountDetail {
                account_id,
                writer,
                key,
                pagination,
            } => self.get_account_detail(
                creator,
                hash,
                account_id,
                writer.as_ref(),
                key.as_deref(),
                pagination.as_ref(),
            ),
            Query::GetRoles => self.get_roles(creator, hash),
            Query::GetRolePermissions { role_id } => {
                self.get_role_permissions(creator, hash, role_id)
            }
            Query::GetAssetInfo { asset_id } => self.get_asset_info(creator, hash, asset_id),
            Query::GetPeers => self.get_peers(creator, hash),
            Query::GetPendingTransactions { pagination } => {
                self.get_pending_transactions(creator, hash, pagination.as_ref())
            }
        }
    }

    /// Logs an error outcome and renders it as a response.
    ///
    /// The message prefix follows the error kind; `body` is the
    /// kind-specific payload (an id, a cursor, an exception text).
    pub(crate) fn log_and_error(
        &self,
        kind: ErrorKind,
        body: &str,
        code: u32,
        hash: &Hash,
    ) -> QueryResponse {
        let message = match kind {
            ErrorKind::NoAccount => format!("could not find account with such id: {body}"),
            ErrorKind::NoSignatories => {
                format!("no signatories found in account with such id: {body}")
            }
            ErrorKind::NoAccountDetail => format!("no details in account with such id: {body}"),
            ErrorKind::NoRoles => {
                format!("no role with such name in account with such id: {body}")
            }
            ErrorKind::NoAsset => {
                format!("no asset with such name in account with such id: {body}")
            }
            ErrorKind::StatefulFailed => format!("failed to execute query: {body}"),
        };
        error!(code, "{message}");
        QueryResponse::error(hash.clone(), kind, message, code)
    }

    /// Renders a database failure as a code-1 response.
    pub(crate) fn internal_error(&self, err: impl Display, hash: &Hash) -> QueryResponse {
        self.log_and_error(
            ErrorKind::StatefulFailed,
            &err.to_string(),
            codes::INTERNAL,
            hash,
        )
    }

    /// Renders a permission refusal listing the capabilities that would
    /// have allowed the query.
    pub(crate) fn permission_denied(
        &self,
        required: &[Permission],
        hash: &Hash,
    ) -> QueryResponse {
        let names: Vec<&str> = required.iter().map(|p| p.name()).collect();
        self.log_and_error(
            ErrorKind::StatefulFailed,
            &format!(
                "user must have at least one of the permissions: {}",
                names.join(", ")
            ),
            codes::NO_PERMISSION,
            hash,
        )
    }

    /// Standalone single-permission check against the creator's roles.
    ///
    /// Used by the variants that bypass the gated-rowset protocol. A
    /// failing lookup is logged and reads as "not granted".
    pub(crate) fn has_account_role_permission(
        &self,
        permission: Permission,
        account_id: &str,
    ) -> bool {
        let sql = perm_sql::role_permission_check_sql(permission, perm_sql::ROLE_ACCOUNT_PARAM);
        let result = self.conn.query_row(
            &sql,
            rusqlite::named_params! {":role_account_id": account_id},
            |row| row.get::<_, bool>(0),
        );
        match result {
            Ok(granted) => granted,
            Err(e) => {
                error!("failed to validate query: {e}");
                false
            }
        }
    }

    /// Probes a table for a key, used by the fallback existence checks of
    /// the transaction-window queries. Table and column names are
    /// compile-time constants of the callers.
    pub(crate) fn exists_in_db(
        &self,
        table: &str,
        key_column: &str,
        probe_column: &str,
        value: &str,
    ) -> rusqlite::Result<bool> {
        let sql = format!("SELECT {probe_column} FROM {table} WHERE {key_column} = ?1 LIMIT 1");
        self.conn
            .query_row(&sql, [value], |_| Ok(()))
            .optional()
            .map(|found| found.is_some())
    }
}
