//! Error types for blogkit

use thiserror::Error;

/// Main error type for page and host operations
#[derive(Error, Debug)]
pub enum PageError {
    /// A selector string could not be parsed
    #[error("Invalid selector: {0}")]
    Selector(String),

    /// A node was expected to be a child of another node but is not
    #[error("Node {child} is not a child of {parent}")]
    NotAChild {
        /// Index of the expected parent
        parent: usize,
        /// Index of the orphaned child
        child: usize,
    },

    /// A node cannot be inserted where it was asked to go
    #[error("Hierarchy error: {0}")]
    Hierarchy(String),

    /// A selector used by a scenario step matched nothing
    #[error("No element matches selector: {0}")]
    NoMatch(String),

    /// Error during preference storage operations
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Behavior configuration rejected
    #[error("Config error: {0}")]
    Config(String),

    /// Scenario expectation did not hold
    #[error("Expectation failed: {0}")]
    Expectation(String),
}

/// Result type alias using PageError
pub type PageResult<T> = Result<T, PageError>;
