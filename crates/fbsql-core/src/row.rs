//! Result rows and the one-or-many driver response.
//!
//! A [`Row`] is an ordered list of values sharing an [`Arc<ColumnInfo>`] so
//! that a result set carries its column names once. Drivers configured with
//! `lowercase_keys` (the default) report lower-cased column names; lookups
//! here are byte-exact against what the driver reported.

use std::sync::Arc;

use crate::value::Value;

/// Column names shared by every row of one result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    names: Vec<String>,
}

impl ColumnInfo {
    /// Create column info from the driver-reported names.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Position of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// The column names in result order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<ColumnInfo>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row over shared column info.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build a standalone row from `(name, value)` pairs.
    pub fn from_pairs(pairs: Vec<(&str, Value)>) -> Self {
        let names = pairs.iter().map(|(n, _)| (*n).to_string()).collect();
        let values = pairs.into_iter().map(|(_, v)| v).collect();
        Self {
            columns: Arc::new(ColumnInfo::new(names)),
            values,
        }
    }

    /// Value at a column position.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of a named column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Shared column info.
    pub fn columns(&self) -> &Arc<ColumnInfo> {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A driver query response: either a single record or a sequence of rows.
///
/// The Firebird driver returns a bare record for singleton results (for
/// example `select gen_id(...)`) and a sequence otherwise. The manager
/// normalizes every response into a `Vec<Row>` so callers never see the
/// distinction.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSet {
    /// A single bare record.
    Single(Row),
    /// An ordered sequence of rows (possibly empty).
    Many(Vec<Row>),
}

impl RowSet {
    /// Normalize into an ordered sequence of rows.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Single(row) => vec![row],
            Self::Many(rows) => rows,
        }
    }

    /// An empty result set.
    pub fn empty() -> Self {
        Self::Many(Vec::new())
    }
}
