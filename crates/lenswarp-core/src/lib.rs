//! # lenswarp-core
//!
//! Core types for lens reprojection.
//!
//! This crate provides the foundational types used throughout the lenswarp workspace:
//!
//! - [`LensModel`] - Closed set of projection models (rectilinear, fisheye)
//! - [`Ray`] - Normalized viewing direction between "unproject" and "project"
//! - [`Image`] - Owned float pixel buffer tagged with the lens that produced it
//! - [`ChannelLayout`] - Channel semantics (RGB, RGBA, RGB + depth)
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. All other lenswarp crates depend on
//! `lenswarp-core`:
//!
//! ```text
//! lenswarp-core (this crate)
//!    ^
//!    |
//!    +-- lenswarp-ops (resampling, reprojection, color)
//!    +-- lenswarp-io (PNG / EXR)
//!    +-- lenswarp-batch (worker pool)
//!    +-- lenswarp-cli
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/deserialize [`LensModel`] (used by the scene config)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod lens;

pub use error::{Error, Result};
pub use image::{ChannelLayout, Image};
pub use lens::{LensModel, Ray};

/// Rec.709 luminance weights `[R, G, B]`.
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Rec.709 luminance of a linear RGB triple.
#[inline]
pub fn luminance_rec709(rgb: [f32; 3]) -> f32 {
    rgb[0] * REC709_LUMA[0] + rgb[1] * REC709_LUMA[1] + rgb[2] * REC709_LUMA[2]
}
