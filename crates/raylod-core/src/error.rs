//! Error types shared across raylod crates.

use thiserror::Error;

/// Workspace-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid data error (malformed buffers, bad strides)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Out of bounds access into a geometry buffer
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
