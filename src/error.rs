//! Error types for the backtester

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Strategy or backtest parameters that cannot be used
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The data source answered but returned no usable bars
    #[error("No data found for {0}")]
    NoData(String),

    /// Fewer bars than the operation needs
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Upstream price API failure
    #[error("Fetch failed for {symbol}: {message}")]
    Fetch { symbol: String, message: String },

    /// A price file lacks one of the OHLCV columns
    #[error("{path}: missing required column {column}")]
    MissingColumn { path: PathBuf, column: String },

    /// A row that could not be parsed
    #[error("{path}: malformed row {row}: {message}")]
    MalformedRow {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidParameter(message.into())
    }
}
