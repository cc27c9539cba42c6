//! Error type for fbsql.
//!
//! Every failure in the stack — attach, begin, query, commit, rollback, or a
//! statement issued against an already rolled-back session — surfaces as the
//! single [`Error`] kind carrying the underlying driver message. Callers see
//! the raw message; the [`OperationKind`] tag classifies the failing phase
//! without changing observed behavior. No layer performs retries: the only
//! recovery responsibility below the caller is resource cleanup.

use std::fmt;

/// The lifecycle phase that produced an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Connection attach failed.
    Attach,
    /// Transaction begin failed.
    Begin,
    /// Statement execution failed (includes catalog lookups).
    Query,
    /// Commit failed.
    Commit,
    /// Rollback failed.
    Rollback,
    /// Statement issued on a session that has already been rolled back.
    Session,
}

impl OperationKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Begin => "begin",
            Self::Query => "query",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
            Self::Session => "session",
        }
    }
}

/// The single error kind of the crate: a database operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: OperationKind,
    message: String,
}

impl Error {
    /// Create an error for an arbitrary phase.
    pub fn new(kind: OperationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Connection attach failure.
    pub fn attach(message: impl Into<String>) -> Self {
        Self::new(OperationKind::Attach, message)
    }

    /// Transaction begin failure.
    pub fn begin(message: impl Into<String>) -> Self {
        Self::new(OperationKind::Begin, message)
    }

    /// Statement failure.
    pub fn query(message: impl Into<String>) -> Self {
        Self::new(OperationKind::Query, message)
    }

    /// Commit failure.
    pub fn commit(message: impl Into<String>) -> Self {
        Self::new(OperationKind::Commit, message)
    }

    /// Rollback failure.
    pub fn rollback(message: impl Into<String>) -> Self {
        Self::new(OperationKind::Rollback, message)
    }

    /// Fast-fail for a session that has already been rolled back.
    pub fn session_failed() -> Self {
        Self::new(
            OperationKind::Session,
            "transaction has already been rolled back; statement not executed",
        )
    }

    /// The failing phase.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The underlying driver message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "database operation failed ({}): {}",
            self.kind.as_str(),
            self.message
        )
    }
}

impl std::error::Error for Error {}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;
