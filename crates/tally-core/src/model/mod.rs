//! Domain model of the ledger read side.
//!
//! Identifier types validate their grammar on construction, which is
//! what makes them safe to embed in query plans. The remaining types are
//! plain records mirroring what the ledger state database and the block
//! store hold.

mod block;
mod hash;
mod ids;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use block::{Block, Transaction};
pub use hash::{Hash, HexParseError, PublicKey};
pub use ids::{AccountId, AssetId, IdParseError, RoleId};

/// A known peer of the ledger network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Network address the peer listens on.
    pub address: String,

    /// The peer's public key.
    pub public_key: PublicKey,
}

/// An account's balance in one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAsset {
    /// Owning account.
    pub account_id: AccountId,

    /// Asset held.
    pub asset_id: AssetId,

    /// Current balance, arbitrary precision.
    pub amount: Decimal,
}

/// Position of one record in an account's detail map.
///
/// Account detail is a two-level map of writer to key to value; a record
/// is addressed by the `(writer, key)` pair, which doubles as the
/// pagination cursor for detail queries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DetailRecordId {
    /// Account that wrote the record.
    pub writer: AccountId,

    /// Key within the writer's namespace.
    pub key: String,
}
