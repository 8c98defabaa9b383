//! Error types for lenswarp-core.
//!
//! # Usage
//!
//! ```rust
//! use lenswarp_core::{Error, Result};
//!
//! fn check(width: u32, height: u32) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::invalid_dimensions(width, height, "zero area"));
//!     }
//!     Ok(())
//! }
//! assert!(check(0, 10).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing images and lens models.
///
/// # Categories
///
/// - **Dimension errors**: [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Channel errors**: [`UnsupportedChannels`](Error::UnsupportedChannels)
/// - **Lens errors**: [`InvalidLens`](Error::InvalidLens)
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid image dimensions.
    ///
    /// Returned when width or height is zero, or when a buffer length does
    /// not match `width * height * channels`.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Channel count that no [`ChannelLayout`](crate::ChannelLayout) describes.
    #[error("unsupported channel count: {0} (expected 3 or 4)")]
    UnsupportedChannels(usize),

    /// Lens parameters violate the model's invariants.
    #[error("invalid {lens} lens: {reason}")]
    InvalidLens {
        /// Lens model name
        lens: &'static str,
        /// Violated constraint
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidLens`] error.
    #[inline]
    pub fn invalid_lens(lens: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidLens {
            lens,
            reason: reason.into(),
        }
    }
}
