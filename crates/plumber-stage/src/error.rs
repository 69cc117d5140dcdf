use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("store error: {0}")]
    Store(#[from] plumber_store::StoreError),
}

pub type StageResult<T> = Result<T, StageError>;
