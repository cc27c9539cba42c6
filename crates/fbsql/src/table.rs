//! Ad-hoc single-row reads.
//!
//! A thin select assembler for the common "fetch one record with a couple of
//! joins and filters" case. Columns, joins, conditions, and ordering are
//! passed through verbatim; the caller is responsible for escaping anything
//! interpolated into them.

use asupersync::{Cx, Outcome};
use fbsql_core::{Driver, Error, Row};

use crate::client::FirebirdClient;

/// A single-row select over one table.
#[derive(Debug, Clone)]
pub struct TableReadRequest {
    table: String,
    columns: Vec<String>,
    joins: Vec<String>,
    conditions: Vec<String>,
    order_by: Vec<String>,
}

impl TableReadRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Columns to select.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// A join clause, appended verbatim after the table.
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    /// A condition; all conditions are ANDed.
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// An order-by term.
    pub fn order_by(mut self, term: impl Into<String>) -> Self {
        self.order_by.push(term.into());
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!(
            "select {} from {}",
            self.columns.join(", "),
            self.table
        );
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.conditions.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.conditions.join(" and "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" order by ");
            sql.push_str(&self.order_by.join(", "));
        }
        sql
    }
}

/// Runs [`TableReadRequest`]s through a [`FirebirdClient`].
#[derive(Debug)]
pub struct TableReader<'a, D: Driver> {
    client: &'a FirebirdClient<D>,
}

impl<'a, D: Driver> TableReader<'a, D> {
    pub fn new(client: &'a FirebirdClient<D>) -> Self {
        Self { client }
    }

    /// Run the select and return the first row, if any.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table))]
    pub async fn first(
        &self,
        cx: &Cx,
        request: TableReadRequest,
    ) -> Outcome<Option<Row>, Error> {
        let sql = request.to_sql();
        self.client
            .execute(cx, &sql, &[])
            .await
            .map(|rows| rows.into_iter().next())
    }
}
