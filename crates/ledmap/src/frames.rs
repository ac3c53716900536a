//! Adapters between the `image` crate and the core frame types.

use std::path::{Path, PathBuf};

use ledmap_core::{FrameClip, FrameError, FrameSource, RgbImage, RgbImageView};

/// Borrow an `image::RgbImage` as a core view.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy an `image::RgbImage` into a core frame.
pub fn to_core_rgb(img: &::image::RgbImage) -> RgbImage {
    RgbImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Convert a core frame back, e.g. to save it. `None` on a malformed buffer.
pub fn to_image_rgb(img: &RgbImage) -> Option<::image::RgbImage> {
    ::image::RgbImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
}

/// Build an in-memory clip from decoded images.
pub fn clip_from_images<I>(images: I) -> FrameClip
where
    I: IntoIterator<Item = ::image::RgbImage>,
{
    FrameClip::new(images.into_iter().map(|img| to_core_rgb(&img)).collect())
}

/// Frames decoded lazily from image files, in file-name order.
///
/// Files that fail to decode surface as transient errors and are skipped
/// by the consumers.
#[derive(Clone, Debug)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequence {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, cursor: 0 }
    }

    /// Every regular file in `dir` with an image extension, sorted by name.
    pub fn from_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && ::image::ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(Self::new(paths))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Option<Result<RgbImage, FrameError>> {
        let path = self.paths.get(self.cursor)?;
        self.cursor += 1;
        Some(
            ::image::open(path)
                .map(|img| to_core_rgb(&img.to_rgb8()))
                .map_err(|e| FrameError::Read(format!("{}: {e}", path.display()))),
        )
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.paths.len())
    }
}
