// crates/northwind-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("no usable input data: {0}")]
    MissingInput(String),

    #[error("invalid transform options: {0}")]
    InvalidOptions(String),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, TransformError>;
