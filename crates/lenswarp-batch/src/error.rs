//! Error types for batch processing.

use lenswarp_io::IoError;
use lenswarp_ops::OpsError;
use std::io;
use thiserror::Error;

/// Error raised while setting up a batch or processing one item.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Reading or decoding the input image failed.
    #[error("decode failed: {0}")]
    Decode(#[source] IoError),

    /// Reprojection failed (invalid scale or sample count).
    #[error("reprojection failed: {0}")]
    Reproject(#[from] OpsError),

    /// Encoding or writing an output image failed.
    #[error("encode failed: {0}")]
    Encode(#[source] IoError),

    /// The item panicked; the payload message, if any.
    #[error("panicked: {0}")]
    Panicked(String),

    /// Listing the input directory or spawning a worker thread failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;
