//! Image loading utilities

use crate::{Error, Result};
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use std::path::{Path, PathBuf};

/// File extensions accepted as slideshow images
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// File extensions accepted as background audio
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// Check whether a path has one of the given extensions (case-insensitive)
pub fn has_extension<P: AsRef<Path>>(path: P, extensions: &[&str]) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// An image file together with its pixel dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ImageAsset {
    /// Read the dimensions of an image without decoding its pixels
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let (width, height) =
            image::image_dimensions(path).map_err(|e| Error::image_decode(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
        })
    }
}

/// Loaded image in RGB format
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// RGB pixels
    pub pixels: RgbImage,
}

impl LoadedImage {
    /// Load an image from a file path
    ///
    /// The format is guessed from the file contents, so a mislabelled
    /// extension still decodes. Any alpha channel is dropped.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let img = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| Error::image_decode(path, image::ImageError::IoError(e)))?
            .decode()
            .map_err(|e| Error::image_decode(path, e))?;

        Ok(Self::from_dynamic_image(img))
    }

    /// Create from a DynamicImage
    pub fn from_dynamic_image(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.to_rgb8();

        Self {
            width,
            height,
            pixels,
        }
    }
}
