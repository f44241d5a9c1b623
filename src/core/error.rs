/// Error Module
///
/// This module defines the failure taxonomy shared by every data-access
/// operation. Callers branch on the [`ErrorKind`]; the message carried by
/// each variant is diagnostic text only.
use serde::Serialize;
use thiserror::Error;

/// Failure type for every data-access operation.
///
/// The taxonomy is deliberately small:
/// - connection problems (authentication, network, unknown host or database)
/// - execution problems (malformed statement, constraint violation, missing
///   table or column, rejected identifier)
/// - empty batch writes
///
/// A read that matches nothing is not a failure and never produces one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// The connection could not be established or was lost mid-call
    #[error("Connection failure: {0}")]
    Connection(String),

    /// The statement could not be built or was rejected by the server
    #[error("Execution failure: {0}")]
    Execution(String),

    /// A batch write was called with no rows
    #[error("Empty input: {0}")]
    EmptyInput(String),
}

/// Stable classification of a [`DataError`], suitable for callers to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConnectionFailure,
    ExecutionFailure,
    EmptyInputFailure,
}

impl DataError {
    pub fn connection(msg: impl Into<String>) -> Self {
        DataError::Connection(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        DataError::Execution(msg.into())
    }

    pub fn empty_input(msg: impl Into<String>) -> Self {
        DataError::EmptyInput(msg.into())
    }

    /// Returns the taxonomy entry for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::Connection(_) => ErrorKind::ConnectionFailure,
            DataError::Execution(_) => ErrorKind::ExecutionFailure,
            DataError::EmptyInput(_) => ErrorKind::EmptyInputFailure,
        }
    }

    /// Returns the diagnostic message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            DataError::Connection(msg) | DataError::Execution(msg) | DataError::EmptyInput(msg) => msg,
        }
    }
}

/// Type alias for Result to use DataError as the error type.
pub type Result<T> = std::result::Result<T, DataError>;
