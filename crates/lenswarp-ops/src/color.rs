//! Colour post-processing: exposure, auto-exposure and Reinhard tonemapping.
//!
//! Applied to scene-linear colour after reprojection, in this order:
//!
//! 1. Auto-exposure gains (grey-world white balance times `0.18 / L_avg`)
//! 2. Manual exposure, `2^EV`
//! 3. Reinhard tonemap, `v / (1 + v / max)`
//!
//! Only the three colour channels are touched; alpha and depth pass through.
//!
//! # Example
//!
//! ```rust
//! use lenswarp_core::{ChannelLayout, Image, LensModel};
//! use lenswarp_ops::ColorProcessor;
//!
//! let lens = LensModel::rectilinear(35.0, 36.0, 24.0).unwrap();
//! let img = Image::from_data(1, 1, ChannelLayout::Rgba, vec![0.25, 0.25, 0.25, 0.5], lens).unwrap();
//!
//! let out = ColorProcessor { exposure_ev: 2.0, ..Default::default() }.process(img);
//! assert_eq!(out.data(), &[1.0, 1.0, 1.0, 0.5]);
//! ```

use lenswarp_core::{Image, REC709_LUMA, luminance_rec709};
use tracing::{debug, trace};

/// Middle-grey key the log-average luminance is mapped to.
pub const KEY_VALUE: f64 = 0.18;

/// Offset keeping `ln` finite on black pixels.
const LOG_DELTA: f64 = 1e-4;

/// Channel means and luminances below this are treated as black.
const MIN_MEAN: f64 = 1e-6;

/// Exposure multiplier for a stop offset: `2^ev`.
#[inline]
pub fn exposure_multiplier(ev: f32) -> f32 {
    ev.exp2()
}

/// Reinhard tonemap with white point `max`.
///
/// Maps `[0, ∞)` monotonically into `[0, max)` and is close to identity for
/// `v` much smaller than `max`. Negative input (bicubic undershoot next to
/// bright pixels) and NaN map to 0.
#[inline]
pub fn reinhard(v: f32, max: f32) -> f32 {
    let v = v.max(0.0);
    v / (1.0 + v / max)
}

/// Statistics derived by auto-exposure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoExposure {
    /// Log-average (geometric mean) Rec.709 luminance of the input.
    pub log_average_luminance: f64,
    /// Exposure multiplier mapping the log-average to [`KEY_VALUE`].
    pub exposure: f32,
    /// Grey-world white balance gains `[R, G, B]`.
    pub white_balance: [f32; 3],
}

impl AutoExposure {
    /// Analyzes the colour channels of `image`.
    ///
    /// Accumulates sequentially in `f64`, so the result depends only on the
    /// pixel values.
    pub fn analyze(image: &Image) -> Self {
        let ch = image.channels();
        let mut log_sum = 0.0f64;
        let mut channel_sum = [0.0f64; 3];

        for px in image.data().chunks_exact(ch) {
            let lum = luminance_rec709([px[0], px[1], px[2]]) as f64;
            log_sum += (LOG_DELTA + lum.max(0.0)).ln();
            for (sum, &v) in channel_sum.iter_mut().zip(px) {
                *sum += v as f64;
            }
        }

        let n = image.pixel_count() as f64;
        let log_average_luminance = (log_sum / n).exp();
        let exposure = if log_average_luminance > MIN_MEAN {
            (KEY_VALUE / log_average_luminance) as f32
        } else {
            1.0
        };

        let means = channel_sum.map(|s| s / n);
        let mean_luminance: f64 = REC709_LUMA
            .iter()
            .zip(&means)
            .map(|(&w, &m)| w as f64 * m)
            .sum();
        let white_balance = means.map(|m| {
            if m > MIN_MEAN && mean_luminance > MIN_MEAN {
                (mean_luminance / m) as f32
            } else {
                1.0
            }
        });

        Self {
            log_average_luminance,
            exposure,
            white_balance,
        }
    }

    /// Per-channel multipliers (white balance times exposure).
    #[inline]
    pub fn gains(&self) -> [f32; 3] {
        self.white_balance.map(|g| g * self.exposure)
    }
}

/// Colour post-processing settings.
///
/// The default is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorProcessor {
    /// Exposure compensation in stops.
    pub exposure_ev: f32,
    /// Reinhard white point; `None` disables tonemapping.
    pub reinhard_max: Option<f32>,
    /// Derive exposure and white balance from the image itself.
    pub auto_exposure: bool,
}

impl ColorProcessor {
    /// Returns `true` if [`process`](Self::process) leaves pixels untouched.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.exposure_ev == 0.0 && self.reinhard_max.is_none() && !self.auto_exposure
    }

    /// Processes `image` in place and returns it.
    pub fn process(&self, image: Image) -> Image {
        self.process_with_stats(image).0
    }

    /// Like [`process`](Self::process), also returning the auto-exposure
    /// statistics when enabled.
    pub fn process_with_stats(&self, mut image: Image) -> (Image, Option<AutoExposure>) {
        if self.is_noop() {
            trace!("color processing disabled");
            return (image, None);
        }

        let stats = self.auto_exposure.then(|| AutoExposure::analyze(&image));
        if let Some(s) = &stats {
            debug!(
                l_avg = s.log_average_luminance,
                exposure = s.exposure,
                wb = ?s.white_balance,
                "auto exposure"
            );
        }

        let manual = exposure_multiplier(self.exposure_ev);
        let gains = stats
            .map(|s| s.gains())
            .unwrap_or([1.0; 3])
            .map(|g| g * manual);
        let max = self.reinhard_max;

        let ch = image.channels();
        for px in image.data_mut().chunks_exact_mut(ch) {
            for (v, &g) in px.iter_mut().zip(&gains) {
                *v *= g;
                if let Some(max) = max {
                    *v = reinhard(*v, max);
                }
            }
        }
        (image, stats)
    }
}
