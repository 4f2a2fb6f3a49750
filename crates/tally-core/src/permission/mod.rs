//! Role capabilities and their bitmask encoding.
//!
//! Every role in the ledger carries a [`PermissionSet`], stored in the
//! `role_has_permissions` table as an integer bitmask. The bit index of
//! each [`Permission`] is a versioned contract with the writer side and
//! with every deployed database: discriminants are explicit and must
//! never be reordered. New capabilities append at the end.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single role capability.
///
/// The enumeration covers the whole capability set of the ledger. The
/// read side only ever checks the query capabilities, but the mask width
/// and bit positions are shared with the writer side, so the full set is
/// defined here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Permission {
    AppendRole = 0,
    CreateRole = 1,
    DetachRole = 2,
    AddAssetQuantity = 3,
    SubtractAssetQuantity = 4,
    AddPeer = 5,
    AddSignatory = 6,
    RemoveSignatory = 7,
    SetQuorum = 8,
    CreateAccount = 9,
    SetDetail = 10,
    CreateAsset = 11,
    Transfer = 12,
    Receive = 13,
    CreateDomain = 14,
    ReadAssets = 15,
    GetRoles = 16,
    GetMyAccount = 17,
    GetAllAccounts = 18,
    GetDomainAccounts = 19,
    GetMySignatories = 20,
    GetAllSignatories = 21,
    GetDomainSignatories = 22,
    GetMyAccountAssets = 23,
    GetAllAccountAssets = 24,
    GetDomainAccountAssets = 25,
    GetMyAccountDetail = 26,
    GetAllAccountDetail = 27,
    GetDomainAccountDetail = 28,
    GetMyAccountTransactions = 29,
    GetAllAccountTransactions = 30,
    GetDomainAccountTransactions = 31,
    GetMyAccountAssetTransactions = 32,
    GetAllAccountAssetTransactions = 33,
    GetDomainAccountAssetTransactions = 34,
    GetMyTransactions = 35,
    GetAllTransactions = 36,
    GetBlocks = 37,
    GetPeers = 38,
    /// Grants every capability, present and future.
    Root = 39,
}

impl Permission {
    /// Every capability, in bit order.
    pub const ALL: [Self; 40] = [
        Self::AppendRole,
        Self::CreateRole,
        Self::DetachRole,
        Self::AddAssetQuantity,
        Self::SubtractAssetQuantity,
        Self::AddPeer,
        Self::AddSignatory,
        Self::RemoveSignatory,
        Self::SetQuorum,
        Self::CreateAccount,
        Self::SetDetail,
        Self::CreateAsset,
        Self::Transfer,
        Self::Receive,
        Self::CreateDomain,
        Self::ReadAssets,
        Self::GetRoles,
        Self::GetMyAccount,
        Self::GetAllAccounts,
        Self::GetDomainAccounts,
        Self::GetMySignatories,
        Self::GetAllSignatories,
        Self::GetDomainSignatories,
        Self::GetMyAccountAssets,
        Self::GetAllAccountAssets,
        Self::GetDomainAccountAssets,
        Self::GetMyAccountDetail,
        Self::GetAllAccountDetail,
        Self::GetDomainAccountDetail,
        Self::GetMyAccountTransactions,
        Self::GetAllAccountTransactions,
        Self::GetDomainAccountTransactions,
        Self::GetMyAccountAssetTransactions,
        Self::GetAllAccountAssetTransactions,
        Self::GetDomainAccountAssetTransactions,
        Self::GetMyTransactions,
        Self::GetAllTransactions,
        Self::GetBlocks,
        Self::GetPeers,
        Self::Root,
    ];

    /// Bit index of this capability in the stored mask.
    #[must_use]
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Human-readable capability name, used in permission-denied messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AppendRole => "can_append_role",
            Self::CreateRole => "can_create_role",
            Self::DetachRole => "can_detach_role",
            Self::AddAssetQuantity => "can_add_asset_qty",
            Self::SubtractAssetQuantity => "can_subtract_asset_qty",
            Self::AddPeer => "can_add_peer",
            Self::AddSignatory => "can_add_signatory",
            Self::RemoveSignatory => "can_remove_signatory",
            Self::SetQuorum => "can_set_quorum",
            Self::CreateAccount => "can_create_account",
            Self::SetDetail => "can_set_detail",
            Self::CreateAsset => "can_create_asset",
            Self::Transfer => "can_transfer",
            Self::Receive => "can_receive",
            Self::CreateDomain => "can_create_domain",
            Self::ReadAssets => "can_read_assets",
            Self::GetRoles => "can_get_roles",
            Self::GetMyAccount => "can_get_my_account",
            Self::GetAllAccounts => "can_get_all_accounts",
            Self::GetDomainAccounts => "can_get_domain_accounts",
            Self::GetMySignatories => "can_get_my_signatories",
            Self::GetAllSignatories => "can_get_all_signatories",
            Self::GetDomainSignatories => "can_get_domain_signatories",
            Self::GetMyAccountAssets => "can_get_my_acc_ast",
            Self::GetAllAccountAssets => "can_get_all_acc_ast",
            Self::GetDomainAccountAssets => "can_get_domain_acc_ast",
            Self::GetMyAccountDetail => "can_get_my_acc_detail",
            Self::GetAllAccountDetail => "can_get_all_acc_detail",
            Self::GetDomainAccountDetail => "can_get_domain_acc_detail",
            Self::GetMyAccountTransactions => "can_get_my_acc_txs",
            Self::GetAllAccountTransactions => "can_get_all_acc_txs",
            Self::GetDomainAccountTransactions => "can_get_domain_acc_txs",
            Self::GetMyAccountAssetTransactions => "can_get_my_acc_ast_txs",
            Self::GetAllAccountAssetTransactions => "can_get_all_acc_ast_txs",
            Self::GetDomainAccountAssetTransactions => "can_get_domain_acc_ast_txs",
            Self::GetMyTransactions => "can_get_my_txs",
            Self::GetAllTransactions => "can_get_all_txs",
            Self::GetBlocks => "can_get_blocks",
            Self::GetPeers => "can_get_peers",
            Self::Root => "root",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of capabilities, encoded as a fixed-width bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(u64);

impl PermissionSet {
    /// Number of defined capability bits.
    pub const WIDTH: u32 = Permission::ALL.len() as u32;

    const MASK: u64 = (1u64 << Self::WIDTH) - 1;

    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set containing a single capability.
    #[must_use]
    pub const fn of(permission: Permission) -> Self {
        Self(1 << permission.bit())
    }

    /// Whether the capability is present.
    #[must_use]
    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & (1 << permission.bit()) != 0
    }

    /// Whether no capability is present.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Adds a capability in place.
    pub fn insert(&mut self, permission: Permission) {
        self.0 |= 1 << permission.bit();
    }

    /// The stored integer mask, as embedded in SQL plans.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn as_mask(self) -> i64 {
        self.0 as i64
    }

    /// Reconstructs a set from a stored mask, dropping undefined bits.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn from_mask(mask: i64) -> Self {
        Self(mask as u64 & Self::MASK)
    }

    /// Iterates the capabilities present in the set.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::empty();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}
