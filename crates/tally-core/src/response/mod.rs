//! The closed response sum type and the query error taxonomy.
//!
//! Every execution path of the executor ends in a [`QueryResponse`];
//! failures are response values, never `Err` or panics. Each response
//! echoes the hash of the query that produced it.

use serde::{Deserialize, Serialize};

use crate::model::{AccountAsset, AccountId, AssetId, Block, DetailRecordId, Hash, Peer,
                   PublicKey, RoleId, Transaction};
use crate::permission::PermissionSet;
use crate::storage::BatchInfo;

/// Numeric error codes of stateful failures.
///
/// The values are a wire contract shared with clients; domain-kind errors
/// (`NoAccount`, `NoAsset`, and friends) carry code 0.
pub mod codes {
    /// Database or storage exception surfaced as text.
    pub const INTERNAL: u32 = 1;
    /// None of the required permissions is present.
    pub const NO_PERMISSION: u32 = 2;
    /// Requested block height exceeds the ledger height.
    pub const HEIGHT_OUT_OF_RANGE: u32 = 3;
    /// Pagination cursor or supplied hash does not resolve.
    pub const BAD_CURSOR: u32 = 4;
    /// Target account of a transaction-list query does not exist.
    pub const NO_ACCOUNT: u32 = 5;
    /// Target asset of a transaction-list query does not exist.
    pub const NO_ASSET: u32 = 6;
}

/// Kind of a failed query, mirrored in the error message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Referenced account does not exist.
    NoAccount,
    /// Account has no signatories.
    NoSignatories,
    /// Account has no detail records (including a nonexistent account).
    NoAccountDetail,
    /// Unknown role.
    NoRoles,
    /// Unknown asset.
    NoAsset,
    /// Failure detected during evaluation; see the numeric code.
    StatefulFailed,
}

/// A failed query outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    /// Error kind.
    pub kind: ErrorKind,

    /// Numeric code; see [`codes`]. Domain-kind errors carry 0.
    pub code: u32,

    /// Human-readable description.
    pub message: String,
}

/// Successful account lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    /// The account id.
    pub account_id: AccountId,
    /// Domain the account belongs to.
    pub domain_id: String,
    /// Signature quorum required for the account's transactions.
    pub quorum: u32,
    /// The detail document, as stored (JSON text).
    pub detail: String,
    /// Roles attached to the account.
    pub roles: Vec<RoleId>,
}

/// One page of a committed-transaction listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionsPage {
    /// Transactions on this page, in commit order.
    pub transactions: Vec<Transaction>,
    /// Number of transactions matching the query, all pages.
    pub total: u64,
    /// Cursor of the next page, present iff more transactions follow.
    pub next_tx_hash: Option<Hash>,
}

/// One page of the caller's pending transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransactionsPage {
    /// Pending transactions on this page.
    pub transactions: Vec<Transaction>,
    /// Number of pending transactions, all pages.
    pub all_transactions_size: u64,
    /// Where the next page starts, if any.
    pub next_batch_info: Option<BatchInfo>,
}

/// One page of an account's asset balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAssetsPage {
    /// Balances on this page, ordered by asset id.
    pub assets: Vec<AccountAsset>,
    /// Number of balances the account holds, all pages.
    pub total: u64,
    /// Cursor of the next page, present iff more balances follow.
    pub next_asset_id: Option<AssetId>,
}

/// One page of an account's detail map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetailPage {
    /// The selected records as a writer-to-key-to-value JSON document.
    pub detail: String,
    /// Number of records matching the filter, all pages.
    pub total: u64,
    /// Cursor of the next page, present iff more records follow.
    pub next_record: Option<DetailRecordId>,
}

/// Successful asset metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// The asset id.
    pub asset_id: AssetId,
    /// Domain the asset belongs to.
    pub domain_id: String,
    /// Number of decimal places of the asset's amounts.
    pub precision: u32,
}

/// Payload of a query response, one variant per query outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseBody {
    /// Account metadata.
    Account(AccountResponse),
    /// A committed block.
    Block(Block),
    /// Signatory public keys.
    Signatories(Vec<PublicKey>),
    /// Unpaginated transaction list (hash lookups, deprecated pending form).
    Transactions(Vec<Transaction>),
    /// Paginated committed transactions.
    TransactionsPage(TransactionsPage),
    /// Paginated pending transactions.
    PendingTransactionsPage(PendingTransactionsPage),
    /// Paginated asset balances.
    AccountAssets(AccountAssetsPage),
    /// Paginated account detail.
    AccountDetail(AccountDetailPage),
    /// Known role names.
    Roles(Vec<RoleId>),
    /// Capability set of one role.
    RolePermissions(PermissionSet),
    /// Asset metadata.
    AssetInfo(AssetInfo),
    /// Known peers.
    Peers(Vec<Peer>),
    /// The query failed.
    Error(QueryError),
}

/// A query outcome, echoing the hash of the originating query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Hash of the query this responds to.
    pub query_hash: Hash,

    /// The outcome payload.
    pub body: ResponseBody,
}

impl QueryResponse {
    /// Wraps a response body with the echoed query hash.
    #[must_use]
    pub fn new(query_hash: Hash, body: ResponseBody) -> Self {
        Self { query_hash, body }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(query_hash: Hash, kind: ErrorKind, message: String, code: u32) -> Self {
        Self::new(
            query_hash,
            ResponseBody::Error(QueryError {
                kind,
                code,
                message,
            }),
        )
    }

    /// The error payload, if this response is a failure.
    #[must_use]
    pub fn as_error(&self) -> Option<&QueryError> {
        match &self.body {
            ResponseBody::Error(error) => Some(error),
            _ => None,
        }
    }
}
