//! # tally-core
//!
//! Read-side query executor for the Tally permissioned ledger.
//!
//! This crate evaluates structured read-only queries from authenticated
//! principals against the ledger state database and the committed block
//! store. Every query is gated by a role-based permission check that is
//! fused directly into the relational plan, so the database answers the
//! data question and the authorization question in a single round trip.
//!
//! ## Architecture
//!
//! - [`executor::QueryExecutor`] dispatches the closed [`query::Query`] sum
//!   type. Each variant builds a SQL statement containing a `has_perms`
//!   common table expression, decodes the gated rowset, and assembles a
//!   typed [`response::QueryResponse`].
//! - [`permission`] defines the ledger capability enumeration and its
//!   stable bitmask encoding, which is the unit of the permission columns
//!   stored in `role_has_permissions`.
//! - [`storage`] holds the collaborator seams: the committed block store
//!   and the pending transaction store, each with an in-memory
//!   implementation.
//! - [`settings`] reads operator-tunable values from the `setting` table
//!   with silent defaulting.
//!
//! ## Concurrency
//!
//! A query executes synchronously on the executor's own database session.
//! Run concurrent queries by giving each executor its own connection; the
//! session is never shared.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use rusqlite::Connection;
//! use tally_core::executor::QueryExecutor;
//! use tally_core::model::{AccountId, Hash};
//! use tally_core::query::{Query, QueryRequest};
//! use tally_core::storage::{InMemoryBlockStorage, InMemoryPendingStore};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let conn = Connection::open("ledger-state.db")?;
//! let executor = QueryExecutor::new(
//!     conn,
//!     Arc::new(InMemoryBlockStorage::new()),
//!     Arc::new(InMemoryPendingStore::new()),
//! )?;
//!
//! let request = QueryRequest {
//!     creator: AccountId::new("alice@test")?,
//!     hash: Hash::from_hex("deadbeef")?,
//!     payload: Query::GetRoles,
//! };
//! let response = executor.execute(&request);
//! assert_eq!(response.query_hash.to_hex(), "deadbeef");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod executor;
pub mod model;
pub mod permission;
pub mod query;
pub mod response;
pub mod settings;
pub mod storage;

pub use executor::QueryExecutor;
pub use model::{AccountId, AssetId, Hash, RoleId};
pub use permission::{Permission, PermissionSet};
pub use query::{Query, QueryRequest};
pub use response::{QueryResponse, ResponseBody};
