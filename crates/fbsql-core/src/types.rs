//! Catalog field types and transaction isolation levels.
//!
//! Firebird's system catalog reports column types as numeric codes in
//! `rdb$fields.rdb$field_type`. [`FieldType`] is the closed enumeration over
//! those codes; every casting decision in the query generator and
//! search-term builder dispatches on it instead of raw numbers.

/// Declared type of a catalog column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Smallint,
    Integer,
    Bigint,
    Float,
    Double,
    Date,
    Time,
    Timestamp,
    Char,
    Varchar,
    Blob,
    /// Any code this layer does not model (arrays, quad, ...).
    Unknown,
}

impl FieldType {
    /// Decode a `rdb$field_type` code.
    pub fn from_code(code: i64) -> Self {
        match code {
            7 => Self::Smallint,
            8 => Self::Integer,
            16 => Self::Bigint,
            10 => Self::Float,
            27 => Self::Double,
            12 => Self::Date,
            13 => Self::Time,
            35 => Self::Timestamp,
            14 => Self::Char,
            37 => Self::Varchar,
            261 => Self::Blob,
            _ => Self::Unknown,
        }
    }

    /// The scalar category used by the external schema emitter.
    pub fn scalar_kind(self) -> ScalarKind {
        match self {
            Self::Smallint | Self::Integer | Self::Bigint | Self::Float | Self::Double => {
                ScalarKind::Number
            }
            Self::Date | Self::Time | Self::Timestamp => ScalarKind::Date,
            Self::Char | Self::Varchar | Self::Blob => ScalarKind::Text,
            Self::Unknown => ScalarKind::Never,
        }
    }
}

/// Scalar category a catalog type maps to in generated record definitions.
///
/// This mapping is shared knowledge with the out-of-scope schema emitter and
/// must stay consistent with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Number,
    Date,
    Text,
    /// Unrepresentable in generated records.
    Never,
}

/// Transaction isolation level requested from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Each statement sees only data committed before it starts. Every
    /// logical unit of work in this layer runs at this level.
    #[default]
    ReadCommitted,
    /// Snapshot (concurrency) isolation.
    Snapshot,
    /// Snapshot table stability (consistency) isolation.
    Consistency,
}
