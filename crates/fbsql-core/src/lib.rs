//! Core types and driver traits for fbsql.
//!
//! `fbsql-core` is the foundation layer of the workspace. It defines the
//! data model and the driver seam that everything else builds on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: [`Driver`], [`DriverConnection`], and
//!   [`DriverTransaction`] are implemented by database drivers; the `fbsql`
//!   facade is generic over them.
//! - **Data model**: [`Value`], [`Row`], and [`RowSet`] represent statement
//!   parameters and query results; [`FieldType`] models the catalog's
//!   numeric type codes as a closed enumeration.
//! - **Structured concurrency**: re-exports `Cx` and `Outcome` from
//!   asupersync so every suspending database operation is cancel-correct.
//!
//! Applications normally depend on the `fbsql` facade; reach for
//! `fbsql-core` directly when writing a driver.

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod driver;
pub mod error;
pub mod options;
pub mod row;
pub mod types;
pub mod value;

pub use driver::{Driver, DriverConnection, DriverTransaction};
pub use error::{Error, OperationKind, Result};
pub use options::ConnectOptions;
pub use row::{ColumnInfo, Row, RowSet};
pub use types::{FieldType, IsolationLevel, ScalarKind};
pub use value::{Value, escape, quote};
