//! The driver boundary.
//!
//! The wire protocol to the Firebird server is owned by a driver crate; this
//! module defines the seam it implements. The contract mirrors the server's
//! own lifecycle: attach a connection, begin a transaction on it, query
//! through the transaction, then commit or roll back and detach.
//!
//! Two rules shape the signatures:
//!
//! - `detach` consumes the connection, so a handle can be released exactly
//!   once and never used afterwards. A failed `attach` returns no handle;
//!   any half-open socket closes on drop.
//! - every method takes a `&Cx` and is expected to observe
//!   `cx.cancel_reason()` at its suspend points, surfacing
//!   `Outcome::Cancelled` instead of blocking a cancelled caller.

use std::future::Future;

use asupersync::{Cx, Outcome};

use crate::error::Error;
use crate::options::ConnectOptions;
use crate::row::RowSet;
use crate::types::IsolationLevel;
use crate::value::Value;

/// Entry point of a driver: creates physical connections.
pub trait Driver: Send + Sync {
    /// The connection handle type.
    type Conn: DriverConnection;

    /// Attach a new physical connection.
    fn attach(
        &self,
        cx: &Cx,
        options: &ConnectOptions,
    ) -> impl Future<Output = Outcome<Self::Conn, Error>> + Send;
}

/// A live connection handle. Exclusively owned by one logical unit of work.
pub trait DriverConnection: Send {
    /// The transaction handle type.
    type Tx: DriverTransaction;

    /// Begin a transaction at the given isolation level.
    fn begin(
        &mut self,
        cx: &Cx,
        isolation: IsolationLevel,
    ) -> impl Future<Output = Outcome<Self::Tx, Error>> + Send;

    /// Release the connection. Consumes the handle: a connection is detached
    /// exactly once, on commit, on rollback, or on a failed begin.
    fn detach(self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;
}

/// A transaction bound 1:1 to its connection.
///
/// `commit` and `rollback` are terminal: after either returns, no further
/// statements may be issued. The manager enforces call-once ordering.
pub trait DriverTransaction: Send {
    /// Run one statement with positional parameters.
    fn query(
        &mut self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<RowSet, Error>> + Send;

    /// Commit the transaction.
    fn commit(&mut self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Roll the transaction back.
    fn rollback(&mut self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;
}
