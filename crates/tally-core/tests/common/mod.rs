//! Shared world-building fixture for the executor tests.
//!
//! The builder plays the writer side: it applies the ledger-state schema,
//! inserts accounts, roles, and assets, and commits blocks to both the
//! position tables and the in-memory block store, keeping the two in sync
//! the way the real writer does.

#![allow(dead_code)]

use std::sync::Arc;

use rusqlite::Connection;
use tally_core::executor::QueryExecutor;
use tally_core::model::{AccountId, AssetId, Hash, Transaction};
use tally_core::model::Block;
use tally_core::permission::PermissionSet;
use tally_core::query::{Query, QueryRequest};
use tally_core::response::{QueryError, QueryResponse, ResponseBody};
use tally_core::storage::{schema, InMemoryBlockStorage, InMemoryPendingStore};

/// Query hash used by every test request.
pub const QUERY_HASH_HEX: &str = "abad1dea";

/// A transaction to commit, with the account/asset pairs it touches.
pub struct TxSpec {
    pub hash: Hash,
    pub creator: &'static str,
    pub touched_assets: Vec<(&'static str, &'static str)>,
}

impl TxSpec {
    pub fn new(hash: Hash, creator: &'static str) -> Self {
        Self {
            hash,
            creator,
            touched_assets: Vec::new(),
        }
    }

    pub fn touching(mut self, account: &'static str, asset: &'static str) -> Self {
        self.touched_assets.push((account, asset));
        self
    }
}

pub struct WorldBuilder {
    conn: Connection,
    blocks: Arc<InMemoryBlockStorage>,
    pending: Arc<InMemoryPendingStore>,
    height: u64,
}

impl WorldBuilder {
    pub fn new() -> Self {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        schema::init_schema(&conn).expect("apply schema");
        Self {
            conn,
            blocks: Arc::new(InMemoryBlockStorage::new()),
            pending: Arc::new(InMemoryPendingStore::new()),
            height: 0,
        }
    }

    pub fn add_role(&self, role: &str, permissions: PermissionSet) -> &Self {
        self.conn
            .execute("INSERT INTO role (role_id) VALUES (?1)", [role])
            .expect("insert role");
        self.conn
            .execute(
                "INSERT INTO role_has_permissions (role_id, permission) VALUES (?1, ?2)",
                rusqlite::params![role, permissions.as_mask()],
            )
            .expect("insert role permissions");
        self
    }

    pub fn add_account(&self, account_id: &str, quorum: u32, data: &str, roles: &[&str]) -> &Self {
        let domain = account_id
            .split_once('@')
            .map(|(_, domain)| domain)
            .expect("fixture account ids carry a domain");
        self.conn
            .execute(
                "INSERT INTO account (account_id, domain_id, quorum, data) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![account_id, domain, quorum, data],
            )
            .expect("insert account");
        for role in roles {
            self.conn
                .execute(
                    "INSERT INTO account_has_roles (account_id, role_id) VALUES (?1, ?2)",
                    rusqlite::params![account_id, role],
                )
                .expect("attach role");
        }
        self
    }

    pub fn add_asset(&self, asset_id: &str, precision: u32) -> &Self {
        let domain = asset_id
            .split_once('#')
            .map(|(_, domain)| domain)
            .expect("fixture asset ids carry a domain");
        self.conn
            .execute(
                "INSERT INTO asset (asset_id, domain_id, precision) VALUES (?1, ?2, ?3)",
                rusqlite::params![asset_id, domain, precision],
            )
            .expect("insert asset");
        self
    }

    pub fn add_account_asset(&self, account_id: &str, asset_id: &str, amount: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO account_has_asset (account_id, asset_id, amount) VALUES (?1, ?2, ?3)",
                rusqlite::params![account_id, asset_id, amount],
            )
            .expect("insert account asset");
        self
    }

    pub fn add_signatory(&self, account_id: &str, public_key_hex: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO account_has_signatory (account_id, public_key) VALUES (?1, ?2)",
                rusqlite::params![account_id, public_key_hex],
            )
            .expect("insert signatory");
        self
    }

    pub fn add_peer(&self, public_key_hex: &str, address: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO peer (public_key, address) VALUES (?1, ?2)",
                rusqlite::params![public_key_hex, address],
            )
            .expect("insert peer");
        self
    }

    /// Commits a block carrying the given transactions, indexing their
    /// positions the way the writer side does.
    pub fn commit_block(&mut self, txs: Vec<TxSpec>) -> u64 {
        self.height += 1;
        let height = self.height;

        let mut block_txs = Vec::with_capacity(txs.len());
        for (index, spec) in txs.iter().enumerate() {
            let index = index as u64;
            self.conn
                .execute(
                    "INSERT INTO position_by_hash (hash, height, \"index\") VALUES (?1, ?2, ?3)",
                    rusqlite::params![spec.hash.to_hex(), height, index],
                )
                .expect("index tx by hash");
            self.conn
                .execute(
                    "INSERT INTO tx_position_by_creator (creator_id, height, \"index\") \
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![spec.creator, height, index],
                )
                .expect("index tx by creator");
            for (account, asset) in &spec.touched_assets {
                self.conn
                    .execute(
                        "INSERT INTO position_by_account_asset \
                         (account_id, asset_id, height, \"index\") VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![account, asset, height, index],
                    )
                    .expect("index tx by account asset");
            }
            block_txs.push(Transaction::new(
                spec.hash.clone(),
                account(spec.creator),
            ));
        }

        self.blocks
            .append(Block::new(height, block_txs))
            .expect("append block");
        height
    }

    /// Indexes a transaction position without committing its block,
    /// leaving a gap in block storage.
    pub fn index_orphan_tx(&mut self, spec: &TxSpec) {
        self.height += 1;
        let height = self.height;
        self.conn
            .execute(
                "INSERT INTO position_by_hash (hash, height, \"index\") VALUES (?1, ?2, 0)",
                rusqlite::params![spec.hash.to_hex(), height],
            )
            .expect("index tx by hash");
        self.conn
            .execute(
                "INSERT INTO tx_position_by_creator (creator_id, height, \"index\") \
                 VALUES (?1, ?2, 0)",
                rusqlite::params![spec.creator, height],
            )
            .expect("index tx by creator");
    }

    pub fn add_pending(&self, tx: Transaction) -> &Self {
        self.pending.insert(tx);
        self
    }

    pub fn finish(self) -> TestWorld {
        let executor =
            QueryExecutor::new(self.conn, self.blocks.clone(), self.pending.clone())
                .expect("construct executor");
        TestWorld {
            executor,
            blocks: self.blocks,
            pending: self.pending,
        }
    }
}

pub struct TestWorld {
    pub executor: QueryExecutor,
    pub blocks: Arc<InMemoryBlockStorage>,
    pub pending: Arc<InMemoryPendingStore>,
}

impl TestWorld {
    pub fn execute(&self, creator: &str, payload: Query) -> QueryResponse {
        let request = QueryRequest {
            creator: account(creator),
            hash: query_hash(),
            payload,
        };
        self.executor.execute(&request)
    }
}

pub fn account(raw: &str) -> AccountId {
    AccountId::new(raw).expect("fixture account id")
}

pub fn asset(raw: &str) -> AssetId {
    AssetId::new(raw).expect("fixture asset id")
}

pub fn query_hash() -> Hash {
    Hash::from_hex(QUERY_HASH_HEX).expect("fixture query hash")
}

/// A distinct transaction hash per tag.
pub fn tx_hash(tag: u8) -> Hash {
    Hash::new(vec![tag; 4])
}

pub fn expect_error(response: &QueryResponse) -> &QueryError {
    response
        .as_error()
        .unwrap_or_else(|| panic!("expected an error response, got {:?}", response.body))
}

pub fn expect_success(response: &QueryResponse) -> &ResponseBody {
    assert!(
        response.as_error().is_none(),
        "expected success, got {:?}",
        response.body
    );
    &response.body
}

/// Asserts the response echoes the fixture query hash.
pub fn assert_hash_echoed(response: &QueryResponse) {
    assert_eq!(response.query_hash, query_hash());
}
