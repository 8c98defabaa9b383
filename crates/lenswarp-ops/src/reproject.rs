//! Lens-to-lens reprojection.
//!
//! For every output pixel the engine casts `n x n` sub-sample rays through
//! the output lens, projects each ray into the input lens and resamples the
//! input there:
//!
//! ```text
//! (x + ox, y + oy) --output.unproject--> Ray --input.project--> (ix, iy)
//!                                                               |
//!                          sample(input, ix - 0.5, iy - 0.5) <--+
//! ```
//!
//! Sub-samples that either lens rejects contribute zero, and the pixel is the
//! unweighted mean over all `n²` sub-samples. Pixels straddling the edge of
//! a fisheye image circle therefore blend towards black, which anti-aliases
//! the FOV boundary.
//!
//! When the `parallel` feature is enabled, output rows are rendered on the
//! rayon thread pool.

use crate::resample::{Kernel, Resampler};
use crate::{OpsError, OpsResult};
use lenswarp_core::{Image, LensModel};
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Supersampling grid over the unit pixel footprint.
///
/// Produces `n²` offsets at `((i + 0.5) / n, (j + 0.5) / n)`; `n = 1` is the
/// pixel centre.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    offsets: Vec<f64>,
}

impl SampleGrid {
    /// Creates an `n x n` grid.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::InvalidParameter`] if `samples_per_dim` is zero.
    pub fn new(samples_per_dim: u32) -> OpsResult<Self> {
        if samples_per_dim == 0 {
            return Err(OpsError::InvalidParameter(
                "samples per dimension must be at least 1".into(),
            ));
        }
        let n = samples_per_dim as f64;
        let offsets = (0..samples_per_dim).map(|i| (i as f64 + 0.5) / n).collect();
        Ok(Self { offsets })
    }

    /// Total number of sub-samples (`n²`).
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() * self.offsets.len()
    }

    /// Always `false`: a grid holds at least one sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Sub-pixel offsets `(ox, oy)`, row by row.
    pub fn offsets(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.offsets
            .iter()
            .flat_map(move |&oy| self.offsets.iter().map(move |&ox| (ox, oy)))
    }
}

/// Renders `input` as seen through `output_lens` at `width x height`.
///
/// The result keeps the input's channel layout and is tagged with
/// `output_lens`. Geometrically invalid pixels become zero; that is never an
/// error.
///
/// # Errors
///
/// - [`OpsError::InvalidParameter`] if `samples_per_dim` is zero
/// - [`OpsError::Core`] if the output size is zero
///
/// # Example
///
/// ```rust
/// use lenswarp_core::{ChannelLayout, Image, LensModel};
/// use lenswarp_ops::{reproject, Kernel};
///
/// let lens = LensModel::rectilinear(20.0, 36.0, 36.0).unwrap();
/// let input = Image::from_data(8, 8, ChannelLayout::Rgb, vec![0.5; 8 * 8 * 3], lens).unwrap();
/// let out = reproject(&input, &lens, 8, 8, 1, Kernel::Bilinear).unwrap();
/// assert!((out.pixel(4, 4)[0] - 0.5).abs() < 1e-6);
/// ```
pub fn reproject(
    input: &Image,
    output_lens: &LensModel,
    width: u32,
    height: u32,
    samples_per_dim: u32,
    kernel: Kernel,
) -> OpsResult<Image> {
    trace!(
        from = input.lens().name(),
        to = output_lens.name(),
        src_w = input.width(),
        src_h = input.height(),
        width,
        height,
        samples_per_dim,
        %kernel,
        "reproject"
    );

    let grid = SampleGrid::new(samples_per_dim)?;
    let mut output = Image::new(width, height, input.layout(), *output_lens)?;
    let ctx = RowContext {
        input,
        output_lens,
        width,
        height,
        grid: &grid,
        resampler: Resampler::new(kernel),
    };
    let stride = width as usize * input.channels();

    #[cfg(feature = "parallel")]
    output
        .data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| ctx.render_row(y as u32, row));

    #[cfg(not(feature = "parallel"))]
    output
        .data_mut()
        .chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| ctx.render_row(y as u32, row));

    Ok(output)
}

/// Shared read-only state for rendering output rows.
struct RowContext<'a> {
    input: &'a Image,
    output_lens: &'a LensModel,
    width: u32,
    height: u32,
    grid: &'a SampleGrid,
    resampler: Resampler,
}

impl RowContext<'_> {
    fn render_row(&self, y: u32, row: &mut [f32]) {
        let ch = self.input.channels();
        let input_lens = self.input.lens();
        let (in_w, in_h) = self.input.dimensions();
        let inv_count = 1.0 / self.grid.len() as f32;
        let mut tap = vec![0.0f32; ch];

        for (x, px) in row.chunks_exact_mut(ch).enumerate() {
            for (ox, oy) in self.grid.offsets() {
                let Some(ray) =
                    self.output_lens
                        .unproject(x as f64 + ox, y as f64 + oy, self.width, self.height)
                else {
                    continue;
                };
                let Some((ix, iy)) = input_lens.project(ray, in_w, in_h) else {
                    continue;
                };
                self.resampler.sample(self.input, ix - 0.5, iy - 0.5, &mut tap);
                for (acc, &v) in px.iter_mut().zip(&tap) {
                    *acc += v;
                }
            }
            for v in px.iter_mut() {
                *v *= inv_count;
            }
        }
    }
}

/// Reprojection settings for one batch: target lens, scale and quality.
///
/// `output_lens = None` keeps the input lens (reprojection disabled).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reprojector {
    /// Target lens, or `None` to keep the input's lens.
    pub output_lens: Option<LensModel>,
    /// Output size factor applied to the input dimensions.
    pub scale: f64,
    /// Supersampling grid size per axis.
    pub samples_per_dim: u32,
    /// Resampling kernel.
    pub kernel: Kernel,
}

impl Default for Reprojector {
    fn default() -> Self {
        Self {
            output_lens: None,
            scale: 1.0,
            samples_per_dim: 1,
            kernel: Kernel::default(),
        }
    }
}

impl Reprojector {
    /// Returns `true` when [`apply`](Self::apply) hands the input back untouched.
    #[inline]
    pub fn is_pass_through(&self) -> bool {
        self.output_lens.is_none() && self.scale == 1.0
    }

    /// Output dimensions for an input of `width x height`:
    /// `floor(dimension * scale)`.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidParameter`] if `scale` is not a positive finite number
    /// - [`OpsError::InvalidDimensions`] if a scaled dimension rounds down to zero
    pub fn output_size(&self, width: u32, height: u32) -> OpsResult<(u32, u32)> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(OpsError::InvalidParameter(format!(
                "scale must be > 0, got {}",
                self.scale
            )));
        }
        let w = (width as f64 * self.scale).floor();
        let h = (height as f64 * self.scale).floor();
        if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
            return Err(OpsError::InvalidDimensions(format!(
                "{width}x{height} scaled by {} gives {w}x{h}",
                self.scale
            )));
        }
        Ok((w as u32, h as u32))
    }

    /// Reprojects `input`, consuming it.
    ///
    /// Pass-through settings return the same buffer bit-identical. With
    /// reprojection disabled but a scale set, the input is resampled onto
    /// its own lens at the new size.
    pub fn apply(&self, input: Image) -> OpsResult<Image> {
        if self.is_pass_through() {
            trace!("reprojection disabled, passing input through");
            return Ok(input);
        }
        let (width, height) = self.output_size(input.width(), input.height())?;
        let lens = self.output_lens.unwrap_or(*input.lens());
        debug!(
            "{} {}x{} -> {} {}x{}",
            input.lens().name(),
            input.width(),
            input.height(),
            lens.name(),
            width,
            height
        );
        reproject(&input, &lens, width, height, self.samples_per_dim, self.kernel)
    }
}
