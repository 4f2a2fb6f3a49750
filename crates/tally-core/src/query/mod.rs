//! The closed query sum type and its pagination metadata.

use serde::{Deserialize, Serialize};

use crate::model::{AccountId, AssetId, DetailRecordId, Hash, RoleId};

/// Pagination metadata for transaction-list queries.
///
/// The cursor is the hash of the first transaction of the requested page.
/// Without a cursor the page starts at the first matching transaction in
/// commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPaginationMeta {
    /// Maximum number of transactions on the page, at least 1.
    pub page_size: u64,

    /// Hash of the first transaction of the page, if resuming.
    pub first_tx_hash: Option<Hash>,
}

/// Pagination metadata for the account-assets query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPaginationMeta {
    /// Maximum number of assets on the page, at least 1.
    pub page_size: u64,

    /// Asset id of the first entry of the page, if resuming.
    pub first_asset_id: Option<AssetId>,
}

/// Pagination metadata for the account-detail query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPaginationMeta {
    /// Maximum number of detail records on the page, at least 1.
    pub page_size: u64,

    /// `(writer, key)` of the first record of the page, if resuming.
    pub first_record: Option<DetailRecordId>,
}

/// A read-only ledger query.
///
/// Each variant carries its own payload; the creator and the query hash
/// travel in the surrounding [`QueryRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    /// Account metadata: domain, quorum, detail document, roles.
    GetAccount {
        /// Target account.
        account_id: AccountId,
    },

    /// One committed block by height.
    GetBlock {
        /// 1-indexed block height.
        height: u64,
    },

    /// Public keys registered as signatories of an account.
    GetSignatories {
        /// Target account.
        account_id: AccountId,
    },

    /// Transactions created by an account, paginated in commit order.
    GetAccountTransactions {
        /// Target account.
        account_id: AccountId,
        /// Page window.
        pagination: TxPaginationMeta,
    },

    /// Committed transactions selected by hash.
    GetTransactions {
        /// Hashes to resolve; must not be empty.
        tx_hashes: Vec<Hash>,
    },

    /// Transactions touching one account-asset pair, paginated in commit
    /// order.
    GetAccountAssetTransactions {
        /// Target account.
        account_id: AccountId,
        /// Target asset.
        asset_id: AssetId,
        /// Page window.
        pagination: TxPaginationMeta,
    },

    /// Asset balances of an account, paginated by asset id.
    GetAccountAssets {
        /// Target account.
        account_id: AccountId,
        /// Page window.
        pagination: AssetPaginationMeta,
    },

    /// An account's detail map, optionally filtered and paginated.
    GetAccountDetail {
        /// Target account.
        account_id: AccountId,
        /// Only records written by this account.
        writer: Option<AccountId>,
        /// Only records under this key.
        key: Option<String>,
        /// Page window; absent means the whole (filtered) map.
        pagination: Option<DetailPaginationMeta>,
    },

    /// All role names known to the ledger.
    GetRoles,

    /// The capability set granted by one role.
    GetRolePermissions {
        /// Role to look up.
        role_id: RoleId,
    },

    /// Asset metadata: domain and precision.
    GetAssetInfo {
        /// Asset to look up.
        asset_id: AssetId,
    },

    /// Known network peers.
    GetPeers,

    /// The caller's pending (not yet committed) transactions.
    GetPendingTransactions {
        /// Page window; absent selects the deprecated non-paginated form.
        pagination: Option<TxPaginationMeta>,
    },
}

/// A query together with its authenticated originator and identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Account the query is executed on behalf of.
    pub creator: AccountId,

    /// Opaque query hash, echoed back in the response.
    pub hash: Hash,

    /// The query itself.
    pub payload: Query,
}
