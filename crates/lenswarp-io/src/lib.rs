//! # lenswarp-io
//!
//! Image I/O for lens reprojection.
//!
//! - **EXR** - OpenEXR, linear float, optional alpha or depth channel
//! - **PNG** - 8/16-bit input, 8-bit output
//!
//! Images carry their lens projection, which no file format records, so
//! [`read`] takes the [`LensModel`] to attach.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lenswarp_core::LensModel;
//!
//! let lens = LensModel::fisheye_equidistant(36.0, 36.0, std::f64::consts::PI)?;
//! let image = lenswarp_io::read("frame_0001.exr", lens)?;
//! lenswarp_io::write(&image, "frame_0001.png")?;
//! ```
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Bit Depths | Channels |
//! |--------|------|-------|------------|----------|
//! | EXR | Yes | Yes | 16f, 32f, 32u in / 32f out | RGB, RGBA, RGB+Z |
//! | PNG | Yes | Yes | 1-16 in / 8 out | grey, grey+alpha, RGB, RGBA |
//!
//! # Feature Flags
//!
//! - `exr` - OpenEXR support (default)
//! - `png` - PNG support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;

#[cfg(feature = "exr")]
pub mod exr;

#[cfg(feature = "png")]
pub mod png;

pub use detect::Format;
pub use error::{IoError, IoResult};

use lenswarp_core::{Image, LensModel};
use std::path::Path;
use tracing::debug;

/// Reads an image, auto-detecting the format, and tags it with `lens`.
///
/// The format is detected by magic bytes, then by file extension.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] for anything but PNG or EXR, or a
/// decode error from the format reader.
pub fn read<P: AsRef<Path>>(path: P, lens: LensModel) -> IoResult<Image> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    debug!(path = %path.display(), %format, "read");

    match format {
        #[cfg(feature = "exr")]
        Format::Exr => exr::read(path, lens),
        #[cfg(feature = "png")]
        Format::Png => png::read(path, lens),
        _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Writes an image; the format is chosen by the file extension.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] if the extension is not `png` or
/// `exr`, or an encode error from the format writer.
pub fn write<P: AsRef<Path>>(image: &Image, path: P) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    debug!(path = %path.display(), %format, "write");

    match format {
        #[cfg(feature = "exr")]
        Format::Exr => exr::write(path, image),
        #[cfg(feature = "png")]
        Format::Png => png::write(path, image),
        _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
    }
}
