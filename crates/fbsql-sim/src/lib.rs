//! Scripted in-memory driver for fbsql tests.
//!
//! [`SimDriver`] implements the `fbsql-core` driver traits without a server.
//! Tests script it two ways:
//!
//! - **responses**: `respond`/`respond_single` register a substring pattern
//!   and the row set any matching statement returns (first registered match
//!   wins; unmatched statements return an empty set);
//! - **failure injection**: `fail_attach`/`fail_begin`/`fail_query`/
//!   `fail_commit` make the corresponding lifecycle step fail with a given
//!   driver message.
//!
//! The driver also keeps ledgers — attach/detach/begin/commit/rollback
//! counters and the ordered statement log — so tests can assert the
//! resource-release and ordering contracts of the manager.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use asupersync::{Cx, Outcome};
use fbsql_core::{
    ConnectOptions, Driver, DriverConnection, DriverTransaction, Error, IsolationLevel, Row,
    RowSet, Value,
};

#[derive(Debug, Clone)]
enum ScriptResponse {
    Rows(RowSet),
    Fail(String),
}

#[derive(Debug)]
struct SimState {
    scripts: Mutex<Vec<(String, ScriptResponse)>>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
    fail_attach: Mutex<Option<String>>,
    fail_begin: Mutex<Option<String>>,
    fail_commit: Mutex<Option<String>>,
    attaches: AtomicUsize,
    detaches: AtomicUsize,
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl SimState {
    fn new() -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            log: Mutex::new(Vec::new()),
            fail_attach: Mutex::new(None),
            fail_begin: Mutex::new(None),
            fail_commit: Mutex::new(None),
            attaches: AtomicUsize::new(0),
            detaches: AtomicUsize::new(0),
            begins: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            rollbacks: AtomicUsize::new(0),
        }
    }

    fn resolve(&self, sql: &str) -> ScriptResponse {
        let scripts = self.scripts.lock().expect("sim scripts lock");
        for (pattern, response) in scripts.iter() {
            if sql.contains(pattern.as_str()) {
                return response.clone();
            }
        }
        ScriptResponse::Rows(RowSet::empty())
    }
}

/// A scripted driver. Clones share state, so tests keep a clone for
/// assertions after handing the driver to the client.
#[derive(Debug, Clone)]
pub struct SimDriver {
    state: Arc<SimState>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SimState::new()),
        }
    }

    // ==================== Scripting ====================

    /// Statements containing `pattern` return `rows`.
    pub fn respond(&self, pattern: &str, rows: Vec<Row>) {
        self.push_script(pattern, ScriptResponse::Rows(RowSet::Many(rows)));
    }

    /// Statements containing `pattern` return a single bare record, the
    /// driver shape the manager must normalize into a one-element sequence.
    pub fn respond_single(&self, pattern: &str, row: Row) {
        self.push_script(pattern, ScriptResponse::Rows(RowSet::Single(row)));
    }

    /// Statements containing `pattern` fail with `message`.
    pub fn fail_query(&self, pattern: &str, message: &str) {
        self.push_script(pattern, ScriptResponse::Fail(message.to_string()));
    }

    /// Every attach fails with `message`.
    pub fn fail_attach(&self, message: &str) {
        *self.state.fail_attach.lock().expect("sim lock") = Some(message.to_string());
    }

    /// Every begin fails with `message`.
    pub fn fail_begin(&self, message: &str) {
        *self.state.fail_begin.lock().expect("sim lock") = Some(message.to_string());
    }

    /// Every commit fails with `message`.
    pub fn fail_commit(&self, message: &str) {
        *self.state.fail_commit.lock().expect("sim lock") = Some(message.to_string());
    }

    fn push_script(&self, pattern: &str, response: ScriptResponse) {
        self.state
            .scripts
            .lock()
            .expect("sim scripts lock")
            .push((pattern.to_string(), response));
    }

    // ==================== Ledgers ====================

    /// Every statement issued, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state
            .log
            .lock()
            .expect("sim log lock")
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// Positional parameters of the `index`-th statement.
    pub fn params_of(&self, index: usize) -> Option<Vec<Value>> {
        self.state
            .log
            .lock()
            .expect("sim log lock")
            .get(index)
            .map(|(_, params)| params.clone())
    }

    pub fn attaches(&self) -> usize {
        self.state.attaches.load(Ordering::SeqCst)
    }

    pub fn detaches(&self) -> usize {
        self.state.detaches.load(Ordering::SeqCst)
    }

    pub fn begins(&self) -> usize {
        self.state.begins.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.state.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.state.rollbacks.load(Ordering::SeqCst)
    }
}

impl Driver for SimDriver {
    type Conn = SimConnection;

    fn attach(
        &self,
        cx: &Cx,
        _options: &ConnectOptions,
    ) -> impl std::future::Future<Output = Outcome<Self::Conn, Error>> + Send {
        let state = Arc::clone(&self.state);
        let cancelled = cx.cancel_reason();
        async move {
            if let Some(reason) = cancelled {
                return Outcome::Cancelled(reason);
            }
            if let Some(message) = state.fail_attach.lock().expect("sim lock").clone() {
                return Outcome::Err(Error::attach(message));
            }
            state.attaches.fetch_add(1, Ordering::SeqCst);
            Outcome::Ok(SimConnection { state })
        }
    }
}

/// A scripted connection handle.
#[derive(Debug)]
pub struct SimConnection {
    state: Arc<SimState>,
}

impl DriverConnection for SimConnection {
    type Tx = SimTransaction;

    fn begin(
        &mut self,
        cx: &Cx,
        _isolation: IsolationLevel,
    ) -> impl std::future::Future<Output = Outcome<Self::Tx, Error>> + Send {
        let state = Arc::clone(&self.state);
        let cancelled = cx.cancel_reason();
        async move {
            if let Some(reason) = cancelled {
                return Outcome::Cancelled(reason);
            }
            if let Some(message) = state.fail_begin.lock().expect("sim lock").clone() {
                return Outcome::Err(Error::begin(message));
            }
            state.begins.fetch_add(1, Ordering::SeqCst);
            Outcome::Ok(SimTransaction { state })
        }
    }

    fn detach(self, _cx: &Cx) -> impl std::future::Future<Output = Outcome<(), Error>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            state.detaches.fetch_add(1, Ordering::SeqCst);
            Outcome::Ok(())
        }
    }
}

/// A scripted transaction handle.
#[derive(Debug)]
pub struct SimTransaction {
    state: Arc<SimState>,
}

impl DriverTransaction for SimTransaction {
    fn query(
        &mut self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = Outcome<RowSet, Error>> + Send {
        let state = Arc::clone(&self.state);
        let sql = sql.to_string();
        let params = params.to_vec();
        let cancelled = cx.cancel_reason();
        async move {
            if let Some(reason) = cancelled {
                return Outcome::Cancelled(reason);
            }
            state
                .log
                .lock()
                .expect("sim log lock")
                .push((sql.clone(), params));
            match state.resolve(&sql) {
                ScriptResponse::Rows(rows) => Outcome::Ok(rows),
                ScriptResponse::Fail(message) => Outcome::Err(Error::query(message)),
            }
        }
    }

    fn commit(&mut self, _cx: &Cx) -> impl std::future::Future<Output = Outcome<(), Error>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            if let Some(message) = state.fail_commit.lock().expect("sim lock").clone() {
                return Outcome::Err(Error::commit(message));
            }
            state.commits.fetch_add(1, Ordering::SeqCst);
            Outcome::Ok(())
        }
    }

    fn rollback(
        &mut self,
        _cx: &Cx,
    ) -> impl std::future::Future<Output = Outcome<(), Error>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            state.rollbacks.fetch_add(1, Ordering::SeqCst);
            Outcome::Ok(())
        }
    }
}
