use thiserror::Error;

/// Failures raised by the loading, aggregation and scale stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChartError {
    #[error("group '{key}' has no numeric values to aggregate")]
    EmptyGroup { key: String },

    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    #[error("{scale} scale has an empty domain")]
    EmptyDomain { scale: &'static str },

    #[error("input data is empty")]
    EmptyInput,
}

pub type ChartResult<T> = Result<T, ChartError>;
