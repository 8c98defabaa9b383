//! Decode/encode seam between the pipeline and the filesystem.

use lenswarp_core::{Image, LensModel};
use lenswarp_io::IoResult;
use std::path::Path;
use std::sync::Arc;

/// Reads input images and writes output images.
///
/// Called concurrently from the batch worker threads.
pub trait Codec: Send + Sync {
    /// Decodes `path`, tagging the image with `lens`.
    fn decode(&self, path: &Path, lens: LensModel) -> IoResult<Image>;

    /// Encodes `image` to `path`; the format follows the extension.
    fn encode(&self, image: &Image, path: &Path) -> IoResult<()>;
}

/// [`Codec`] backed by `lenswarp-io` (PNG and EXR files).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCodec;

impl Codec for FileCodec {
    fn decode(&self, path: &Path, lens: LensModel) -> IoResult<Image> {
        lenswarp_io::read(path, lens)
    }

    fn encode(&self, image: &Image, path: &Path) -> IoResult<()> {
        lenswarp_io::write(image, path)
    }
}

/// Shares one codec between a pipeline and its owner.
impl<C: Codec + ?Sized> Codec for Arc<C> {
    fn decode(&self, path: &Path, lens: LensModel) -> IoResult<Image> {
        (**self).decode(path, lens)
    }

    fn encode(&self, image: &Image, path: &Path) -> IoResult<()> {
        (**self).encode(image, path)
    }
}
