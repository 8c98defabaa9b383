//! PNG format support.
//!
//! Reading accepts 8-bit and 16-bit greyscale, greyscale+alpha, RGB and RGBA
//! (palette and low bit depths are expanded by the decoder) and normalizes
//! samples to `[0, 1]`. Greyscale is replicated into RGB.
//!
//! Writing produces 8-bit RGB or RGBA. Values are clamped to `[0, 1]` and
//! rounded; a depth channel has no PNG counterpart and is dropped.

use crate::{IoError, IoResult};
use lenswarp_core::{ChannelLayout, Image, LensModel};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::trace;

/// Reads a PNG file, tagging the result with `lens`.
pub fn read<P: AsRef<Path>>(path: P, lens: LensModel) -> IoResult<Image> {
    let file = File::open(path.as_ref())?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let bytes = &buf[..info.buffer_size()];

    let samples: Vec<f32> = match info.bit_depth {
        png::BitDepth::Eight => bytes.iter().map(|&v| v as f32 / 255.0).collect(),
        png::BitDepth::Sixteen => bytes
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]) as f32 / 65535.0)
            .collect(),
        other => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {:?}",
                info.color_type, other
            )));
        }
    };

    let (layout, data) = match info.color_type {
        png::ColorType::Rgb => (ChannelLayout::Rgb, samples),
        png::ColorType::Rgba => (ChannelLayout::Rgba, samples),
        png::ColorType::Grayscale => (
            ChannelLayout::Rgb,
            samples.iter().flat_map(|&g| [g, g, g]).collect(),
        ),
        png::ColorType::GrayscaleAlpha => (
            ChannelLayout::Rgba,
            samples
                .chunks_exact(2)
                .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
                .collect(),
        ),
        other => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {:?}",
                other, info.bit_depth
            )));
        }
    };

    trace!(
        width = info.width,
        height = info.height,
        ?layout,
        "png decoded"
    );
    Ok(Image::from_data(info.width, info.height, layout, data, lens)?)
}

/// Writes an image to an 8-bit PNG file.
pub fn write<P: AsRef<Path>>(path: P, image: &Image) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);

    let layout = image.layout();
    let (color_type, keep) = if layout.has_alpha() {
        (png::ColorType::Rgba, 4)
    } else {
        (png::ColorType::Rgb, 3)
    };

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(color_type);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::default());

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    let u8_data: Vec<u8> = image
        .data()
        .chunks_exact(image.channels())
        .flat_map(|px| px[..keep].iter().map(|&v| to_u8(v)))
        .collect();

    png_writer
        .write_image_data(&u8_data)
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    Ok(())
}

/// Quantizes a normalized sample; NaN maps to 0.
#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
