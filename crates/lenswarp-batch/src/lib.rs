//! # lenswarp-batch
//!
//! Concurrent batch conversion of image datasets.
//!
//! - [`BatchPipeline`] - Fixed number of worker threads, one image per worker at a time
//! - [`ItemState`] - Per-item state machine with forward-only transitions
//! - [`Codec`] / [`FileCodec`] - Decode/encode seam (PNG and EXR files)
//! - [`FrameFilter`], [`collect_inputs`], [`output_path`] - Input selection and output naming
//!
//! # Guarantees
//!
//! - At most `parallelism` items are in flight at once
//! - With one worker, items run in submission order
//! - A failing or panicking item is reported as `Failed`; the rest continue
//! - [`BatchPipeline::shutdown`] returns only after every submitted item
//!   reported a terminal state
//!
//! # Example
//!
//! ```rust,no_run
//! use lenswarp_batch::{BatchConfig, BatchPipeline, FileCodec, FrameFilter, collect_inputs};
//! use lenswarp_core::LensModel;
//! use lenswarp_io::Format;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let lens = LensModel::fisheye_equisolid(8.0, 36.0, 24.0, std::f64::consts::PI)?;
//! let mut config = BatchConfig::new(lens, "out");
//! config.formats = vec![Format::Png, Format::Exr];
//! config.skip_if_exists = true;
//!
//! let mut pipeline = BatchPipeline::new(config, FileCodec)?;
//! for path in collect_inputs(Path::new("frames"), &FrameFilter::new("cam0_", ""))? {
//!     pipeline.submit(path);
//! }
//! let summary = pipeline.shutdown();
//! println!("{} done, {} skipped, {} failed", summary.done, summary.skipped, summary.failed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod codec;
mod error;
mod filter;
mod inputs;
mod pipeline;
pub mod state;

pub use codec::{Codec, FileCodec};
pub use error::{BatchError, BatchResult};
pub use filter::FrameFilter;
pub use inputs::{collect_inputs, output_path};
pub use pipeline::{BatchConfig, BatchPipeline, BatchSummary};
pub use state::{ItemReport, ItemState, Outcome};
