//! Connection and transaction lifecycle management.
//!
//! [`FirebirdClient`] owns a driver and fixed connection options; every
//! logical unit of work attaches its own physical connection. Two entry
//! points exist:
//!
//! - [`FirebirdClient::execute`] — attach, begin a read-committed
//!   transaction, run one statement, commit, detach. Any failure rolls back
//!   and the connection is still detached before the call returns.
//! - [`FirebirdClient::transaction`] — attach and begin up front, then run
//!   any number of statements through the returned [`TransactionSession`]
//!   before committing. The first failure rolls back, releases the
//!   connection, and freezes the session.
//!
//! There are no retries anywhere in this module; the caller owns retry
//! policy. The manager's only recovery responsibility is resource cleanup.

use asupersync::{Cx, Outcome};
use fbsql_core::driver::{Driver, DriverConnection, DriverTransaction};
use fbsql_core::{ConnectOptions, Error, IsolationLevel, Row, Value};

/// Name of the legacy fixed-width text domain the search-term builder casts
/// blob columns through.
pub const LEGACY_TEXT_DOMAIN: &str = "VARCHAR5000";

const DOMAIN_LOOKUP: &str =
    "select rdb$field_name as fname from rdb$fields where rdb$field_name = 'VARCHAR5000'";

const DOMAIN_CREATE: &str = "CREATE DOMAIN VARCHAR5000 AS VARCHAR(5000) \
     CHARACTER SET WIN1252 COLLATE WIN_PTBR";

/// Connection/transaction manager over a [`Driver`].
///
/// Constructed once per application (or per database) and passed by
/// reference into the generators. The only state shared between concurrent
/// calls is the read-only [`ConnectOptions`].
#[derive(Debug)]
pub struct FirebirdClient<D: Driver> {
    driver: D,
    options: ConnectOptions,
}

impl<D: Driver> FirebirdClient<D> {
    /// Construct the client and run the schema bootstrap.
    ///
    /// The bootstrap checks the catalog for the [`LEGACY_TEXT_DOMAIN`]
    /// domain and creates it when absent. It is idempotent and must
    /// complete before any generator logic runs, so this is the only
    /// constructor.
    pub async fn initialize(
        cx: &Cx,
        driver: D,
        options: ConnectOptions,
    ) -> Outcome<Self, Error> {
        let client = Self { driver, options };
        match client.ensure_legacy_text_domain(cx).await {
            Outcome::Ok(()) => Outcome::Ok(client),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// The fixed connection options.
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Run one statement in its own connection and transaction.
    ///
    /// The result is always an ordered sequence of rows, even when the
    /// driver reports a single bare record.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> Outcome<Vec<Row>, Error> {
        tracing::debug!(sql, "executing statement");

        let mut conn = match self.driver.attach(cx, &self.options).await {
            Outcome::Ok(conn) => conn,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        let outcome = run_single(cx, &mut conn, sql, params).await;

        // Single exit: the connection is detached on every path after a
        // successful attach, exactly once.
        if let Outcome::Err(e) = conn.detach(cx).await {
            tracing::warn!(error = %e, "detach failed after statement");
        }

        outcome
    }

    /// Open a multi-statement transaction session.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn transaction(&self, cx: &Cx) -> Outcome<TransactionSession<D>, Error> {
        let mut conn = match self.driver.attach(cx, &self.options).await {
            Outcome::Ok(conn) => conn,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        match conn.begin(cx, IsolationLevel::ReadCommitted).await {
            Outcome::Ok(tx) => Outcome::Ok(TransactionSession {
                conn: Some(conn),
                tx: Some(tx),
                results: Vec::new(),
                failed: false,
            }),
            Outcome::Err(e) => {
                if let Outcome::Err(detach_err) = conn.detach(cx).await {
                    tracing::warn!(error = %detach_err, "detach failed after begin failure");
                }
                Outcome::Err(e)
            }
            Outcome::Cancelled(r) => {
                let _ = conn.detach(cx).await;
                Outcome::Cancelled(r)
            }
            Outcome::Panicked(p) => {
                let _ = conn.detach(cx).await;
                Outcome::Panicked(p)
            }
        }
    }

    async fn ensure_legacy_text_domain(&self, cx: &Cx) -> Outcome<(), Error> {
        let rows = match self.execute(cx, DOMAIN_LOOKUP, &[]).await {
            Outcome::Ok(rows) => rows,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        if !rows.is_empty() {
            return Outcome::Ok(());
        }

        tracing::info!(domain = LEGACY_TEXT_DOMAIN, "creating legacy text domain");
        self.execute(cx, DOMAIN_CREATE, &[]).await.map(|_| ())
    }
}

/// Attach is done; begin, query, and commit-or-rollback on this connection.
async fn run_single<C: DriverConnection>(
    cx: &Cx,
    conn: &mut C,
    sql: &str,
    params: &[Value],
) -> Outcome<Vec<Row>, Error> {
    let mut tx = match conn.begin(cx, IsolationLevel::ReadCommitted).await {
        Outcome::Ok(tx) => tx,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };

    let rows = match tx.query(cx, sql, params).await {
        Outcome::Ok(set) => set.into_rows(),
        Outcome::Err(e) => {
            rollback_quietly(cx, &mut tx).await;
            return Outcome::Err(e);
        }
        Outcome::Cancelled(r) => {
            rollback_quietly(cx, &mut tx).await;
            return Outcome::Cancelled(r);
        }
        Outcome::Panicked(p) => {
            rollback_quietly(cx, &mut tx).await;
            return Outcome::Panicked(p);
        }
    };

    match tx.commit(cx).await {
        Outcome::Ok(()) => Outcome::Ok(rows),
        Outcome::Err(e) => {
            rollback_quietly(cx, &mut tx).await;
            Outcome::Err(e)
        }
        Outcome::Cancelled(r) => {
            rollback_quietly(cx, &mut tx).await;
            Outcome::Cancelled(r)
        }
        Outcome::Panicked(p) => Outcome::Panicked(p),
    }
}

async fn rollback_quietly<T: DriverTransaction>(cx: &Cx, tx: &mut T) {
    if let Outcome::Err(e) = tx.rollback(cx).await {
        tracing::warn!(error = %e, "rollback failed");
    }
}

/// A multi-statement transaction over one connection.
///
/// Statements execute in invocation order and their normalized results
/// accumulate in that order. The first failure rolls back, releases the
/// connection, and freezes the session: every later [`execute`] fails fast
/// with the structured session error without reaching the driver, and
/// [`commit`] becomes a no-op that returns whatever results were gathered.
///
/// [`execute`]: TransactionSession::execute
/// [`commit`]: TransactionSession::commit
pub struct TransactionSession<D: Driver> {
    conn: Option<D::Conn>,
    tx: Option<<D::Conn as DriverConnection>::Tx>,
    results: Vec<Vec<Row>>,
    failed: bool,
}

impl<D: Driver> std::fmt::Debug for TransactionSession<D>
where
    D::Conn: std::fmt::Debug,
    <D::Conn as DriverConnection>::Tx: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSession")
            .field("conn", &self.conn)
            .field("tx", &self.tx)
            .field("results", &self.results)
            .field("failed", &self.failed)
            .finish()
    }
}

impl<D: Driver> TransactionSession<D> {
    /// Run one statement without committing.
    pub async fn execute(
        &mut self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> Outcome<Vec<Row>, Error> {
        if self.failed {
            return Outcome::Err(Error::session_failed());
        }
        let Some(tx) = self.tx.as_mut() else {
            return Outcome::Err(Error::session_failed());
        };

        match tx.query(cx, sql, params).await {
            Outcome::Ok(set) => {
                let rows = set.into_rows();
                self.results.push(rows.clone());
                Outcome::Ok(rows)
            }
            Outcome::Err(e) => {
                self.abort(cx).await;
                Outcome::Err(e)
            }
            Outcome::Cancelled(r) => {
                self.abort(cx).await;
                Outcome::Cancelled(r)
            }
            Outcome::Panicked(p) => {
                self.abort(cx).await;
                Outcome::Panicked(p)
            }
        }
    }

    /// Commit and release the connection, returning the accumulated
    /// per-statement results.
    ///
    /// No-op on an already failed session: the rollback and release have
    /// already happened, and the results gathered before the failure are
    /// returned as-is.
    pub async fn commit(mut self, cx: &Cx) -> Outcome<Vec<Vec<Row>>, Error> {
        if self.failed {
            return Outcome::Ok(std::mem::take(&mut self.results));
        }
        let Some(mut tx) = self.tx.take() else {
            return Outcome::Ok(std::mem::take(&mut self.results));
        };

        match tx.commit(cx).await {
            Outcome::Ok(()) => {
                self.release(cx).await;
                Outcome::Ok(std::mem::take(&mut self.results))
            }
            Outcome::Err(e) => {
                rollback_quietly(cx, &mut tx).await;
                self.release(cx).await;
                self.failed = true;
                Outcome::Err(e)
            }
            Outcome::Cancelled(r) => {
                rollback_quietly(cx, &mut tx).await;
                self.release(cx).await;
                self.failed = true;
                Outcome::Cancelled(r)
            }
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// True once a statement has failed and the session is frozen.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    async fn abort(&mut self, cx: &Cx) {
        self.failed = true;
        if let Some(mut tx) = self.tx.take() {
            rollback_quietly(cx, &mut tx).await;
        }
        self.release(cx).await;
    }

    async fn release(&mut self, cx: &Cx) {
        if let Some(conn) = self.conn.take() {
            if let Outcome::Err(e) = conn.detach(cx).await {
                tracing::warn!(error = %e, "detach failed");
            }
        }
    }
}

impl<D: Driver> Drop for TransactionSession<D> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            // Cannot detach asynchronously in Drop; the handle closes when it
            // drops, but the server-side transaction stays open until then.
            tracing::warn!("transaction session dropped without commit or rollback");
        }
    }
}
