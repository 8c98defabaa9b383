//! Fractional-position image sampling.
//!
//! Positions are in pixel-centre coordinates: `(0.0, 0.0)` is the centre of
//! the top-left pixel. Every filter tap that lands outside the image
//! contributes zero with its weight; coordinates are never clamped and the
//! buffer is never read out of bounds, so content fades out towards the
//! border instead of smearing edge pixels.
//!
//! # Kernels
//!
//! - [`Kernel::Nearest`] - Single tap, rounded position
//! - [`Kernel::Bilinear`] - 2x2 taps, triangle filter
//! - [`Kernel::Bicubic`] - 4x4 taps, Catmull-Rom (`a = -0.5`)
//!
//! # Example
//!
//! ```rust
//! use lenswarp_core::{ChannelLayout, Image, LensModel};
//! use lenswarp_ops::{Kernel, Resampler};
//!
//! let lens = LensModel::rectilinear(35.0, 36.0, 24.0).unwrap();
//! let img = Image::from_data(2, 1, ChannelLayout::Rgb, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0], lens).unwrap();
//!
//! let mut out = [0.0f32; 3];
//! Resampler::new(Kernel::Bilinear).sample(&img, 0.5, 0.0, &mut out);
//! assert_eq!(out, [0.5, 0.5, 0.5]);
//! ```

use lenswarp_core::Image;
use std::fmt;
use std::str::FromStr;

/// Catmull-Rom tension.
const CATMULL_ROM_A: f32 = -0.5;

/// Interpolation kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kernel {
    /// Nearest-neighbor (fastest, no interpolation).
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
    /// Catmull-Rom bicubic interpolation.
    #[default]
    Bicubic,
}

impl Kernel {
    /// Returns the support radius for this kernel.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Kernel::Nearest => 0.5,
            Kernel::Bilinear => 1.0,
            Kernel::Bicubic => 2.0,
        }
    }

    /// Evaluates the kernel at distance `t` from the sample position.
    #[inline]
    pub fn weight(&self, t: f32) -> f32 {
        match self {
            Kernel::Nearest => {
                if t.abs() < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Kernel::Bilinear => {
                let at = t.abs();
                if at < 1.0 { 1.0 - at } else { 0.0 }
            }
            Kernel::Bicubic => catmull_rom(t),
        }
    }

    /// Lowercase kernel name.
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Nearest => "nearest",
            Kernel::Bilinear => "bilinear",
            Kernel::Bicubic => "bicubic",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Kernel::Nearest),
            "bilinear" => Ok(Kernel::Bilinear),
            "bicubic" => Ok(Kernel::Bicubic),
            other => Err(format!("unknown kernel '{other}' (expected nearest, bilinear or bicubic)")),
        }
    }
}

/// Catmull-Rom cubic weight.
#[inline]
fn catmull_rom(t: f32) -> f32 {
    const A: f32 = CATMULL_ROM_A;
    let at = t.abs();
    if at < 1.0 {
        ((A + 2.0) * at - (A + 3.0)) * at * at + 1.0
    } else if at < 2.0 {
        ((A * at - 5.0 * A) * at + 8.0 * A) * at - 4.0 * A
    } else {
        0.0
    }
}

/// Samples an [`Image`] at fractional positions with a fixed [`Kernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resampler {
    kernel: Kernel,
}

impl Resampler {
    /// Creates a resampler using `kernel`.
    #[inline]
    pub fn new(kernel: Kernel) -> Self {
        Self { kernel }
    }

    /// Kernel in use.
    #[inline]
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Writes the interpolated channels at `(x, y)` into `out`.
    ///
    /// `out` must hold exactly `image.channels()` values. Channels are
    /// filtered independently with identical weights.
    pub fn sample(&self, image: &Image, x: f64, y: f64, out: &mut [f32]) {
        debug_assert_eq!(out.len(), image.channels());
        out.fill(0.0);
        match self.kernel {
            Kernel::Nearest => sample_nearest(image, x, y, out),
            Kernel::Bilinear => sample_separable::<2>(image, Kernel::Bilinear, x, y, out),
            Kernel::Bicubic => sample_separable::<4>(image, Kernel::Bicubic, x, y, out),
        }
    }
}

fn sample_nearest(image: &Image, x: f64, y: f64, out: &mut [f32]) {
    let ix = x.round();
    let iy = y.round();
    if ix < 0.0 || iy < 0.0 || ix >= image.width() as f64 || iy >= image.height() as f64 {
        return;
    }
    out.copy_from_slice(image.pixel(ix as u32, iy as u32));
}

/// Separable filter with `TAPS` taps per axis centred on the sample.
fn sample_separable<const TAPS: usize>(image: &Image, kernel: Kernel, x: f64, y: f64, out: &mut [f32]) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let ch = image.channels();
    let data = image.data();

    let x0 = x.floor();
    let y0 = y.floor();
    // First tap sits TAPS/2 - 1 pixels left of / above the floor position
    let first_x = x0 as i64 - (TAPS as i64 / 2 - 1);
    let first_y = y0 as i64 - (TAPS as i64 / 2 - 1);

    let mut wx = [0.0f32; TAPS];
    let mut wy = [0.0f32; TAPS];
    for k in 0..TAPS {
        wx[k] = kernel.weight((x - (first_x + k as i64) as f64) as f32);
        wy[k] = kernel.weight((y - (first_y + k as i64) as f64) as f32);
    }

    for (j, &wj) in wy.iter().enumerate() {
        let sy = first_y + j as i64;
        if wj == 0.0 || sy < 0 || sy >= h {
            continue;
        }
        let row = sy as usize * w as usize * ch;
        for (i, &wi) in wx.iter().enumerate() {
            let sx = first_x + i as i64;
            if wi == 0.0 || sx < 0 || sx >= w {
                continue;
            }
            let weight = wi * wj;
            let idx = row + sx as usize * ch;
            for (o, &v) in out.iter_mut().zip(&data[idx..idx + ch]) {
                *o += weight * v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lenswarp_core::{ChannelLayout, LensModel};

    fn lens() -> LensModel {
        LensModel::rectilinear(35.0, 36.0, 24.0).unwrap()
    }

    fn constant(w: u32, h: u32, v: f32) -> Image {
        Image::from_data(w, h, ChannelLayout::Rgb, vec![v; (w * h * 3) as usize], lens()).unwrap()
    }

    /// Horizontal ramp: value = x.
    fn ramp(w: u32, h: u32) -> Image {
        let mut data = Vec::with_capacity((w * h) as usize);
        for _ in 0..h {
            for x in 0..w {
                data.push(x as f32);
            }
        }
        let rgb: Vec<f32> = data.iter().flat_map(|&v| [v, v, v]).collect();
        Image::from_data(w, h, ChannelLayout::Rgb, rgb, lens()).unwrap()
    }

    #[test]
    fn test_kernel_weights() {
        assert_eq!(Kernel::Bicubic.weight(0.0), 1.0);
        assert_eq!(Kernel::Bicubic.weight(1.0), 0.0);
        assert_eq!(Kernel::Bicubic.weight(2.0), 0.0);
        assert_eq!(Kernel::Bilinear.weight(0.25), 0.75);
        assert_eq!(Kernel::Nearest.weight(0.6), 0.0);
        // Catmull-Rom weights at a half-pixel offset
        assert_relative_eq!(Kernel::Bicubic.weight(0.5), 0.5625);
        assert_relative_eq!(Kernel::Bicubic.weight(1.5), -0.0625);
    }

    #[test]
    fn test_weights_partition_unity() {
        for kernel in [Kernel::Bilinear, Kernel::Bicubic] {
            for step in 0..10 {
                let f = step as f32 / 10.0;
                let sum: f32 = (-1..=2).map(|k| kernel.weight(f - k as f32)).sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_integer_positions_hit_pixel_centres() {
        let img = ramp(8, 4);
        let mut out = [0.0; 3];
        for kernel in [Kernel::Nearest, Kernel::Bilinear, Kernel::Bicubic] {
            Resampler::new(kernel).sample(&img, 3.0, 2.0, &mut out);
            assert_relative_eq!(out[0], 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_interior_interpolation() {
        let img = ramp(8, 4);
        let mut out = [0.0; 3];
        Resampler::new(Kernel::Bilinear).sample(&img, 2.25, 1.5, &mut out);
        assert_relative_eq!(out[0], 2.25, epsilon = 1e-6);
        // Catmull-Rom reproduces linear ramps exactly
        Resampler::new(Kernel::Bicubic).sample(&img, 4.7, 1.3, &mut out);
        assert_relative_eq!(out[1], 4.7, epsilon = 1e-5);
    }

    #[test]
    fn test_nearest_rounds() {
        let img = ramp(8, 1);
        let mut out = [0.0; 3];
        let r = Resampler::new(Kernel::Nearest);
        r.sample(&img, 2.4, 0.0, &mut out);
        assert_eq!(out[0], 2.0);
        r.sample(&img, 2.6, 0.2, &mut out);
        assert_eq!(out[0], 3.0);
    }

    #[test]
    fn test_out_of_range_is_zero() {
        let img = constant(4, 4, 1.0);
        let mut out = [7.0; 3];
        for kernel in [Kernel::Nearest, Kernel::Bilinear, Kernel::Bicubic] {
            Resampler::new(kernel).sample(&img, -5.0, 1.0, &mut out);
            assert_eq!(out, [0.0; 3]);
            Resampler::new(kernel).sample(&img, 1.0, 10.0, &mut out);
            assert_eq!(out, [0.0; 3]);
        }
    }

    #[test]
    fn test_edge_taps_fade_to_zero() {
        let img = constant(4, 4, 1.0);
        let mut out = [0.0; 3];
        // Half a pixel beyond the left centre: one of two taps is outside
        Resampler::new(Kernel::Bilinear).sample(&img, -0.5, 1.0, &mut out);
        assert_relative_eq!(out[0], 0.5, epsilon = 1e-6);
        // Right border, same situation
        Resampler::new(Kernel::Bilinear).sample(&img, 3.5, 1.0, &mut out);
        assert_relative_eq!(out[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_channels_independent() {
        let data = vec![1.0, 2.0, 3.0, 0.5, 3.0, 5.0, 7.0, 0.25];
        let img = Image::from_data(2, 1, ChannelLayout::Rgba, data, lens()).unwrap();
        let mut out = [0.0; 4];
        Resampler::new(Kernel::Bilinear).sample(&img, 0.5, 0.0, &mut out);
        assert_eq!(out, [2.0, 3.5, 5.0, 0.375]);
    }

    #[test]
    fn test_kernel_from_str() {
        assert_eq!("Bicubic".parse::<Kernel>().unwrap(), Kernel::Bicubic);
        assert_eq!(Kernel::Nearest.to_string(), "nearest");
        assert!("lanczos".parse::<Kernel>().is_err());
        assert_eq!(Kernel::default(), Kernel::Bicubic);
    }
}
