//! Sequence (generator) access.
//!
//! Firebird sequences follow a naming convention here: the sequence feeding
//! a table's primary key is `gen_<table>_id`, auxiliary sequences are
//! `gen_<table>`. Advancing one is a single `gen_id(name, 1)` select against
//! `rdb$database`.

use asupersync::{Cx, Outcome};
use fbsql_core::{Driver, Error, Value};

use crate::client::FirebirdClient;

/// The advanced sequence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextId {
    pub next_id: i64,
}

/// Which sequence of a table to advance.
#[derive(Debug, Clone)]
pub struct NextIdRequest {
    table: String,
    is_primary_key: bool,
}

impl NextIdRequest {
    /// The primary-key sequence of `table` (`gen_<table>_id`).
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            is_primary_key: true,
        }
    }

    /// Target the bare `gen_<table>` sequence instead.
    pub fn auxiliary(mut self) -> Self {
        self.is_primary_key = false;
        self
    }

    fn sequence_name(&self) -> String {
        if self.is_primary_key {
            format!("gen_{}_id", self.table)
        } else {
            format!("gen_{}", self.table)
        }
    }
}

/// Advances sequences through a [`FirebirdClient`].
#[derive(Debug)]
pub struct SequenceAccessor<'a, D: Driver> {
    client: &'a FirebirdClient<D>,
}

impl<'a, D: Driver> SequenceAccessor<'a, D> {
    pub fn new(client: &'a FirebirdClient<D>) -> Self {
        Self { client }
    }

    /// Advance the requested sequence by one and return the new value.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table))]
    pub async fn next_id(&self, cx: &Cx, request: NextIdRequest) -> Outcome<NextId, Error> {
        let sql = format!(
            "select gen_id({}, 1) from rdb$database",
            request.sequence_name()
        );

        let rows = match self.client.execute(cx, &sql, &[]).await {
            Outcome::Ok(rows) => rows,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        let value = rows
            .first()
            .and_then(|row| row.get("gen_id"))
            .and_then(Value::as_i64);

        match value {
            Some(next_id) => Outcome::Ok(NextId { next_id }),
            None => Outcome::Err(Error::query(format!(
                "sequence {} returned no value",
                request.sequence_name()
            ))),
        }
    }
}
