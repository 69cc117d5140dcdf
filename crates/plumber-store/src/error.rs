/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend failed while executing the operation.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from turning a JSON filter object into a [`crate::Filter`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter must be a JSON object")]
    NotAnObject,

    #[error("invalid _id: {0}")]
    InvalidId(String),

    #[error("unknown operator {0}")]
    UnknownOperator(String),

    #[error("operator {op} expects {expected}")]
    OperandType { op: String, expected: &'static str },

    #[error("empty field path in {0:?}")]
    EmptyPath(String),
}
