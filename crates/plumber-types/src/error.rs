use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("stage {stage} out of range 1..={max}")]
    StageOutOfRange { stage: i64, max: u32 },

    #[error("invalid stage number: {0}")]
    InvalidStage(String),

    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),
}
