//! Format detection and decoding of files produced by other writers.

use approx::assert_relative_eq;
use lenswarp_core::{ChannelLayout, Image, LensModel};
use lenswarp_io::{Format, IoError, read, write};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

fn lens() -> LensModel {
    LensModel::fisheye_equisolid(8.0, 36.0, 24.0, std::f64::consts::PI).unwrap()
}

fn write_raw_png(path: &Path, w: u32, h: u32, color: png::ColorType, depth: png::BitDepth, bytes: &[u8]) {
    let file = BufWriter::new(File::create(path).unwrap());
    let mut encoder = png::Encoder::new(file, w, h);
    encoder.set_color(color);
    encoder.set_depth(depth);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(bytes).unwrap();
    writer.finish().unwrap();
}

#[test]
fn read_detects_format_from_content() {
    let dir = tempfile::tempdir().unwrap();
    let png_path = dir.path().join("frame.png");
    let image = Image::from_data(1, 1, ChannelLayout::Rgb, vec![1.0, 0.0, 0.0], lens()).unwrap();
    write(&image, &png_path).unwrap();

    let disguised = dir.path().join("frame.bin");
    std::fs::rename(&png_path, &disguised).unwrap();

    assert_eq!(Format::detect(&disguised).unwrap(), Format::Png);
    let loaded = read(&disguised, lens()).unwrap();
    assert_eq!(loaded.data(), &[1.0, 0.0, 0.0]);
    assert_eq!(*loaded.lens(), lens());
}

#[test]
fn unsupported_formats_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"not an image").unwrap();
    assert!(matches!(read(&path, lens()), Err(IoError::UnsupportedFormat(_))));

    let image = Image::new(1, 1, ChannelLayout::Rgb, lens()).unwrap();
    assert!(matches!(
        write(&image, dir.path().join("out.tiff")),
        Err(IoError::UnsupportedFormat(_))
    ));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read(dir.path().join("absent.png"), lens()).is_err());
}

#[test]
fn png_16bit_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep.png");
    let samples: [u16; 4] = [0, 65535, 32768, 1000];
    let bytes: Vec<u8> = samples.iter().flat_map(|v| v.to_be_bytes()).collect();
    write_raw_png(&path, 1, 1, png::ColorType::Rgba, png::BitDepth::Sixteen, &bytes);

    let img = read(&path, lens()).unwrap();
    assert_eq!(img.layout(), ChannelLayout::Rgba);
    assert_eq!(img.data()[0], 0.0);
    assert_eq!(img.data()[1], 1.0);
    assert_relative_eq!(img.data()[2], 32768.0 / 65535.0);
    assert_relative_eq!(img.data()[3], 1000.0 / 65535.0);
}

#[test]
fn png_greyscale_expanded() {
    let dir = tempfile::tempdir().unwrap();
    let grey = dir.path().join("grey.png");
    write_raw_png(&grey, 2, 1, png::ColorType::Grayscale, png::BitDepth::Eight, &[0, 255]);
    let img = read(&grey, lens()).unwrap();
    assert_eq!(img.layout(), ChannelLayout::Rgb);
    assert_eq!(img.data(), &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

    let grey_alpha = dir.path().join("grey_alpha.png");
    write_raw_png(&grey_alpha, 1, 1, png::ColorType::GrayscaleAlpha, png::BitDepth::Eight, &[255, 0]);
    let img = read(&grey_alpha, lens()).unwrap();
    assert_eq!(img.layout(), ChannelLayout::Rgba);
    assert_eq!(img.data(), &[1.0, 1.0, 1.0, 0.0]);
}

#[test]
fn png_alpha_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alpha.png");
    let image = Image::from_data(1, 1, ChannelLayout::Rgba, vec![0.2, 0.4, 0.6, 0.8], lens()).unwrap();
    write(&image, &path).unwrap();
    let loaded = read(&path, lens()).unwrap();
    assert_eq!(loaded.layout(), ChannelLayout::Rgba);
    for (a, b) in loaded.data().iter().zip(image.data()) {
        assert!((a - b).abs() <= 0.5 / 255.0 + 1e-6);
    }
}

#[test]
fn exr_layer_prefixed_half_channels() {
    use exr::prelude::*;
    use smallvec::smallvec;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beauty.exr");
    let half = |v: &[f32]| FlatSamples::F16(v.iter().map(|&x| f16::from_f32(x)).collect());
    let channels = AnyChannels::sort(smallvec![
        AnyChannel::new("beauty.R", half(&[0.5, 2.0])),
        AnyChannel::new("beauty.G", half(&[0.25, 4.0])),
        AnyChannel::new("beauty.B", half(&[0.125, 8.0])),
        AnyChannel::new("beauty.A", half(&[1.0, 0.5])),
    ]);
    let layer = Layer::new((2, 1), LayerAttributes::named("beauty"), Encoding::UNCOMPRESSED, channels);
    exr::prelude::Image::from_layer(layer).write().to_file(&path).unwrap();

    let img = lenswarp_io::read(&path, lens()).unwrap();
    assert_eq!(img.layout(), ChannelLayout::Rgba);
    assert_eq!(img.data(), &[0.5, 0.25, 0.125, 1.0, 2.0, 4.0, 8.0, 0.5]);
}

#[test]
fn exr_rgba_roundtrip_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rgba.exr");
    let data: Vec<f32> = (0..6 * 4 * 4).map(|i| i as f32 * 0.37 - 3.0).collect();
    let image = Image::from_data(6, 4, ChannelLayout::Rgba, data.clone(), lens()).unwrap();
    write(&image, &path).unwrap();

    let loaded = read(&path, lens()).unwrap();
    assert_eq!(loaded.layout(), ChannelLayout::Rgba);
    assert_eq!(loaded.data(), &data[..]);
}
