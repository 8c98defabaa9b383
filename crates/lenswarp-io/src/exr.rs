//! OpenEXR format support.
//!
//! Reads the first valid layer of a flat (non-deep) file. Channels are
//! matched by the name after the last `.`, so both `R` and `beauty.R` are
//! accepted:
//!
//! | Channels present | Layout |
//! |------------------|--------|
//! | R, G, B, Z (or `depth`) | [`ChannelLayout::RgbDepth`] |
//! | R, G, B, A | [`ChannelLayout::Rgba`] |
//! | R, G, B | [`ChannelLayout::Rgb`] |
//!
//! A single `Y` channel is accepted as greyscale. Half and uint samples are
//! converted to `f32`.
//!
//! Writing produces one ZIP-compressed layer of 32-bit float channels.

use crate::{IoError, IoResult};
use ::exr::prelude::*;
use lenswarp_core::{ChannelLayout, LensModel};
use smallvec::smallvec;
use std::path::Path;
use tracing::trace;

/// Reads an EXR file, tagging the result with `lens`.
pub fn read<P: AsRef<Path>>(path: P, lens: LensModel) -> IoResult<lenswarp_core::Image> {
    let image = ::exr::prelude::read()
        .no_deep_data()
        .largest_resolution_level()
        .all_channels()
        .first_valid_layer()
        .all_attributes()
        .from_file(path.as_ref())
        .map_err(|e| IoError::DecodeError(e.to_string()))?;

    let layer = &image.layer_data;
    let (w, h) = (layer.size.width(), layer.size.height());
    let pixel_count = w * h;

    let find_ch = |names: &[&str]| {
        layer.channel_data.list.iter().find(|c| {
            let full = c.name.to_string();
            let short = full.rsplit('.').next().unwrap_or(&full);
            names.iter().any(|n| short.eq_ignore_ascii_case(n))
        })
    };

    let (r, g, b) = match (find_ch(&["R"]), find_ch(&["G"]), find_ch(&["B"])) {
        (Some(r), Some(g), Some(b)) => (to_f32(r), to_f32(g), to_f32(b)),
        _ => match find_ch(&["Y"]) {
            Some(y) => {
                let y = to_f32(y);
                (y.clone(), y.clone(), y)
            }
            None => return Err(IoError::MissingData("no R/G/B or Y channels".into())),
        },
    };

    let aux = find_ch(&["Z", "depth"])
        .map(|c| (ChannelLayout::RgbDepth, to_f32(c)))
        .or_else(|| find_ch(&["A"]).map(|c| (ChannelLayout::Rgba, to_f32(c))));
    let layout = aux.as_ref().map_or(ChannelLayout::Rgb, |(l, _)| *l);

    let mut data = Vec::with_capacity(pixel_count * layout.channels());
    for i in 0..pixel_count {
        data.extend_from_slice(&[r[i], g[i], b[i]]);
        if let Some((_, a)) = &aux {
            data.push(a[i]);
        }
    }

    trace!(width = w, height = h, ?layout, "exr decoded");
    Ok(lenswarp_core::Image::from_data(
        w as u32, h as u32, layout, data, lens,
    )?)
}

/// Converts a channel's samples to `f32`.
fn to_f32(channel: &AnyChannel<FlatSamples>) -> Vec<f32> {
    match &channel.sample_data {
        FlatSamples::F32(d) => d.clone(),
        FlatSamples::F16(d) => d.iter().map(|v| v.to_f32()).collect(),
        FlatSamples::U32(d) => d.iter().map(|&v| v as f32).collect(),
    }
}

/// Writes an image to a 32-bit float EXR file.
pub fn write<P: AsRef<Path>>(path: P, image: &lenswarp_core::Image) -> IoResult<()> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let ch = image.channels();

    let plane = |c: usize| -> FlatSamples {
        FlatSamples::F32(image.data().chunks_exact(ch).map(|px| px[c]).collect())
    };

    let mut channels = smallvec![
        AnyChannel::new("R", plane(0)),
        AnyChannel::new("G", plane(1)),
        AnyChannel::new("B", plane(2)),
    ];
    match image.layout() {
        ChannelLayout::Rgba => channels.push(AnyChannel::new("A", plane(3))),
        ChannelLayout::RgbDepth => channels.push(AnyChannel::new("Z", plane(3))),
        ChannelLayout::Rgb => {}
    }

    let layer = Layer::new(
        (width, height),
        LayerAttributes::named(image.lens().name()),
        Encoding::SMALL_LOSSLESS,
        AnyChannels::sort(channels),
    );

    Image::from_layer(layer)
        .write()
        .to_file(path.as_ref())
        .map_err(|e| IoError::EncodeError(e.to_string()))?;

    Ok(())
}
