//! Metadata-driven Firebird data access.
//!
//! `fbsql` synthesizes SQL against a Firebird database by consulting the
//! database's own system catalog: how a value is cast, truncated, or
//! case-folded before it is embedded in a statement is decided per column
//! from the catalog's declared type, length, domain, and collation.
//!
//! # Layers
//!
//! - [`FirebirdClient`] — connection/transaction lifecycle. `execute` runs
//!   one statement in its own attach/begin/commit/detach envelope;
//!   `transaction` opens a multi-statement [`TransactionSession`] that
//!   freezes on the first failure.
//! - [`QueryGenerator`] — catalog-driven `update or insert` / `update`
//!   statement generation.
//! - [`SearchTerms`] — free-text search predicates over catalog-aware casts.
//! - [`SequenceAccessor`] and [`TableReader`] — sequence advancement and
//!   ad-hoc single-row reads.
//! - [`catalog`] — the read-only system-catalog queries behind all of it.
//!
//! The client is generic over the [`fbsql_core::Driver`] trait; tests run
//! against a scripted in-memory driver, production against a wire driver.
//!
//! ```no_run
//! use fbsql::prelude::*;
//! # use fbsql_core::{Cx, Driver, Outcome};
//! # async fn demo<D: Driver>(cx: &Cx, driver: D) -> Outcome<(), fbsql::Error> {
//! let options = ConnectOptions::new("db.local", "SYSDBA", "/data/erp.fdb");
//! let client = match FirebirdClient::initialize(cx, driver, options).await {
//!     Outcome::Ok(client) => client,
//!     other => return other.map(|_| ()),
//! };
//!
//! let query = QueryGenerator::new(&client)
//!     .generate(
//!         cx,
//!         GenerateRequest::upsert("customer")
//!             .primary_key("id")
//!             .set("name", "Ann Marie")
//!             .set("city", "Lisboa"),
//!     )
//!     .await;
//! # let _ = query;
//! # Outcome::Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod generate;
pub mod search;
pub mod sequence;
pub mod table;

pub use client::{FirebirdClient, LEGACY_TEXT_DOMAIN, TransactionSession};
pub use fbsql_core::{
    ConnectOptions, Cx, Error, FieldType, IsolationLevel, OperationKind, Outcome, Result, Row,
    RowSet, ScalarKind, Value,
};
pub use generate::{GenerateRequest, GeneratedQuery, QueryGenerator, QueryMode, Record};
pub use search::{SearchRequest, SearchTerms};
pub use sequence::{NextId, NextIdRequest, SequenceAccessor};
pub use table::{TableReadRequest, TableReader};

/// Common imports for application code.
pub mod prelude {
    pub use crate::catalog::{ColumnMetadata, RelationField};
    pub use crate::client::{FirebirdClient, TransactionSession};
    pub use crate::generate::{GenerateRequest, GeneratedQuery, QueryGenerator, QueryMode, Record};
    pub use crate::search::{SearchRequest, SearchTerms};
    pub use crate::sequence::{NextId, NextIdRequest, SequenceAccessor};
    pub use crate::table::{TableReadRequest, TableReader};
    pub use fbsql_core::{ConnectOptions, Error, Outcome, Row, Value};
}
