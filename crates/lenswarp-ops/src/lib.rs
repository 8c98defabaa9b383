//! # lenswarp-ops
//!
//! Image operations for lens reprojection.
//!
//! # Modules
//!
//! - [`resample`] - Fractional-position sampling (nearest, bilinear, Catmull-Rom)
//! - [`reproject`] - Per-pixel mapping between lens models with supersampling
//! - [`color`] - Exposure, auto-exposure / white balance, Reinhard tonemap
//!
//! # Example
//!
//! ```rust
//! use lenswarp_core::{ChannelLayout, Image, LensModel};
//! use lenswarp_ops::{ColorProcessor, Kernel, Reprojector};
//!
//! let fisheye = LensModel::fisheye_equidistant(36.0, 36.0, std::f64::consts::PI).unwrap();
//! let input = Image::new(64, 64, ChannelLayout::Rgb, fisheye).unwrap();
//!
//! let reprojector = Reprojector {
//!     output_lens: Some(LensModel::rectilinear(12.0, 36.0, 36.0).unwrap()),
//!     scale: 0.5,
//!     samples_per_dim: 2,
//!     kernel: Kernel::Bilinear,
//! };
//! let out = reprojector.apply(input).unwrap();
//! assert_eq!(out.dimensions(), (32, 32));
//!
//! let graded = ColorProcessor { exposure_ev: 1.0, ..Default::default() }.process(out);
//! assert_eq!(graded.lens().name(), "rectilinear");
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` (default) - Reproject rows on the rayon thread pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod color;
pub mod reproject;
pub mod resample;

pub use color::{AutoExposure, ColorProcessor};
pub use error::{OpsError, OpsResult};
pub use reproject::{Reprojector, SampleGrid, reproject};
pub use resample::{Kernel, Resampler};
