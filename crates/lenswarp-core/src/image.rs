//! Image buffer type for lens reprojection.
//!
//! [`Image`] is an owned, interleaved `f32` buffer tagged with the
//! [`LensModel`] that produced it. Buffers move between pipeline stages
//! (decode, reproject, colour, encode) and are never shared; `Clone` is an
//! explicit deep copy.
//!
//! # Memory Layout
//!
//! Pixels are stored in **row-major** order, top-to-bottom:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  <- Row 0
//!         [R G B R G B R G B ...]  <- Row 1
//!         ...
//! ```
//!
//! Four-channel layouts interleave the auxiliary channel:
//! `[R G B A ...]` for [`ChannelLayout::Rgba`], `[R G B Z ...]` for
//! [`ChannelLayout::RgbDepth`].
//!
//! # Usage
//!
//! ```rust
//! use lenswarp_core::{ChannelLayout, Image, LensModel};
//!
//! let lens = LensModel::rectilinear(35.0, 36.0, 24.0).unwrap();
//! let mut img = Image::new(300, 200, ChannelLayout::Rgba, lens).unwrap();
//!
//! img.pixel_mut(10, 20).copy_from_slice(&[1.0, 0.5, 0.25, 1.0]);
//! assert_eq!(img.pixel(10, 20)[1], 0.5);
//! ```

use crate::{Error, LensModel, Result};

/// Semantics of the channels stored per pixel.
///
/// The first three channels are always linear R, G, B. The optional fourth
/// channel is carried through colour processing unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// Red, green, blue, depth (Z).
    RgbDepth,
}

impl ChannelLayout {
    /// Number of interleaved channels.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba | Self::RgbDepth => 4,
        }
    }

    /// Default layout for a channel count: 3 is RGB, 4 is RGBA.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedChannels`] for any other count.
    pub fn from_channels(channels: usize) -> Result<Self> {
        match channels {
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            n => Err(Error::UnsupportedChannels(n)),
        }
    }

    /// Returns `true` if the layout carries an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }

    /// Returns `true` if the layout carries a depth channel.
    #[inline]
    pub const fn has_depth(self) -> bool {
        matches!(self, Self::RgbDepth)
    }
}

/// Owned float image with its lens projection.
///
/// # Invariants
///
/// - `width > 0` and `height > 0`
/// - `data.len() == width * height * layout.channels()`
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    data: Vec<f32>,
    lens: LensModel,
}

impl Image {
    /// Creates a zero-filled image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32, layout: ChannelLayout, lens: LensModel) -> Result<Self> {
        check_size(width, height)?;
        let len = width as usize * height as usize * layout.channels();
        Ok(Self {
            width,
            height,
            layout,
            data: vec![0.0; len],
            lens,
        })
    }

    /// Creates an image from existing interleaved pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if a dimension is zero or the
    /// buffer length doesn't match `width * height * channels`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lenswarp_core::{ChannelLayout, Image, LensModel};
    ///
    /// let lens = LensModel::fisheye_equidistant(36.0, 36.0, std::f64::consts::PI).unwrap();
    /// let img = Image::from_data(4, 2, ChannelLayout::Rgb, vec![0.5; 24], lens).unwrap();
    /// assert_eq!(img.pixel_count(), 8);
    /// assert!(Image::from_data(4, 2, ChannelLayout::Rgba, vec![0.5; 24], lens).is_err());
    /// ```
    pub fn from_data(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        data: Vec<f32>,
        lens: LensModel,
    ) -> Result<Self> {
        check_size(width, height)?;
        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} elements, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
            lens,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Channel layout.
    #[inline]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Number of interleaved channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Lens that produced this image.
    #[inline]
    pub fn lens(&self) -> &LensModel {
        &self.lens
    }

    /// Interleaved pixel data.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable interleaved pixel data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Channels of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let idx = self.index(x, y);
        &self.data[idx..idx + self.channels()]
    }

    /// Mutable channels of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [f32] {
        let idx = self.index(x, y);
        let c = self.channels();
        &mut self.data[idx..idx + c]
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * self.channels()
    }
}

fn check_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_dimensions(width, height, "zero area"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lens() -> LensModel {
        LensModel::rectilinear(35.0, 36.0, 24.0).unwrap()
    }

    #[test]
    fn test_layout_channels() {
        assert_eq!(ChannelLayout::Rgb.channels(), 3);
        assert_eq!(ChannelLayout::Rgba.channels(), 4);
        assert_eq!(ChannelLayout::RgbDepth.channels(), 4);
        assert_eq!(ChannelLayout::from_channels(4).unwrap(), ChannelLayout::Rgba);
        assert!(matches!(
            ChannelLayout::from_channels(2),
            Err(Error::UnsupportedChannels(2))
        ));
        assert!(ChannelLayout::RgbDepth.has_depth());
        assert!(!ChannelLayout::RgbDepth.has_alpha());
    }

    #[test]
    fn test_new_zeroed() {
        let img = Image::new(8, 4, ChannelLayout::RgbDepth, lens()).unwrap();
        assert_eq!(img.dimensions(), (8, 4));
        assert_eq!(img.data().len(), 8 * 4 * 4);
        assert!(img.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Image::new(0, 4, ChannelLayout::Rgb, lens()).is_err());
        assert!(Image::from_data(4, 0, ChannelLayout::Rgb, vec![], lens()).is_err());
    }

    #[test]
    fn test_from_data_length_mismatch() {
        let err = Image::from_data(2, 2, ChannelLayout::Rgb, vec![0.0; 11], lens()).unwrap_err();
        assert!(err.to_string().contains("expected 12 elements, got 11"));
    }

    #[test]
    fn test_pixel_access() {
        let mut img = Image::new(3, 2, ChannelLayout::Rgb, lens()).unwrap();
        img.pixel_mut(2, 1).copy_from_slice(&[0.1, 0.2, 0.3]);
        assert_eq!(img.pixel(2, 1), &[0.1, 0.2, 0.3]);
        assert_eq!(img.data()[15..18], [0.1, 0.2, 0.3]);
    }

    #[test]
    #[should_panic]
    fn test_pixel_out_of_bounds() {
        let img = Image::new(3, 2, ChannelLayout::Rgb, lens()).unwrap();
        let _ = img.pixel(3, 0);
    }

    #[test]
    fn test_clone_is_deep() {
        let a = Image::from_data(1, 1, ChannelLayout::Rgb, vec![1.0, 2.0, 3.0], lens()).unwrap();
        let mut b = a.clone();
        b.data_mut()[0] = 9.0;
        assert_eq!(a.data()[0], 1.0);
    }
}
