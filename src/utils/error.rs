use std::path::PathBuf;

use thiserror::Error;

/// Error type for every pipeline stage
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required input file does not exist
    #[error("FileNotFound: {}", .0.display())]
    FileNotFound(PathBuf),
    /// Input bytes are not valid in the requested text encoding
    #[error(
        "DecodeError: {path} is not valid {encoding}; try another encoding (e.g. utf-8, euc-kr)"
    )]
    DecodeError { path: String, encoding: String },
    /// Delimited text could not be parsed
    #[error("CsvError: {0}")]
    CsvError(#[from] csv::Error),
    /// Snapshot serialization or deserialization failed
    #[error("ArrowError: {0}")]
    ArrowError(String),
    /// A column the stage depends on is absent
    #[error("SchemaError: missing column '{column}'")]
    SchemaError { column: String },
    /// Validation errors (e.g. empty sample, snapshot mismatch)
    #[error("ValidationError: {0}")]
    ValidationError(String),
    /// Configuration file could not be read
    #[error("ConfigError: {0}")]
    ConfigError(String),
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        PipelineError::SchemaError {
            column: column.into(),
        }
    }
}

impl From<arrow::error::ArrowError> for PipelineError {
    fn from(e: arrow::error::ArrowError) -> Self {
        PipelineError::ArrowError(e.to_string())
    }
}
