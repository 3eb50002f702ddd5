//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid time window: start {start_ms}ms is not before end {end_ms}ms")]
    InvalidWindow { start_ms: i64, end_ms: i64 },

    #[error("Unknown source video index: {0}")]
    UnknownVideoIndex(usize),
}
