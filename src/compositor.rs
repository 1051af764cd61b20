//! Letterbox composition of source images onto a fixed canvas

use crate::encoder::Frame;
use crate::image_loader::LoadedImage;
use crate::Result;
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::borrow::Cow;
use std::path::Path;

/// Where a scaled source image lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Scaled image width
    pub width: u32,
    /// Scaled image height
    pub height: u32,
    /// Left edge of the scaled image on the canvas
    pub x: u32,
    /// Top edge of the scaled image on the canvas
    pub y: u32,
}

impl Placement {
    /// Uniformly scale `(src_w, src_h)` to fit inside `(canvas_w, canvas_h)`
    /// and center it
    ///
    /// The scaled image never exceeds the canvas, so nothing is cropped; the
    /// remaining border becomes letterbox/pillarbox bars.
    pub fn fit(src_w: u32, src_h: u32, canvas_w: u32, canvas_h: u32) -> Self {
        let scale_x = canvas_w as f64 / src_w as f64;
        let scale_y = canvas_h as f64 / src_h as f64;
        let scale = scale_x.min(scale_y);

        let width = ((src_w as f64 * scale).round() as u32).clamp(1, canvas_w);
        let height = ((src_h as f64 * scale).round() as u32).clamp(1, canvas_h);

        Self {
            width,
            height,
            x: (canvas_w - width) / 2,
            y: (canvas_h - height) / 2,
        }
    }
}

/// Letterbox an RGB image onto a black canvas of the given size
pub fn letterbox(image: &RgbImage, canvas_w: u32, canvas_h: u32) -> RgbImage {
    if image.dimensions() == (canvas_w, canvas_h) {
        return image.clone();
    }

    let placement = Placement::fit(image.width(), image.height(), canvas_w, canvas_h);

    let scaled: Cow<'_, RgbImage> = if image.dimensions() == (placement.width, placement.height)
    {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(
            image,
            placement.width,
            placement.height,
            FilterType::Lanczos3,
        ))
    };

    // RgbImage::new is zero-filled, i.e. black
    let mut canvas = RgbImage::new(canvas_w, canvas_h);
    imageops::replace(
        &mut canvas,
        &*scaled,
        placement.x as i64,
        placement.y as i64,
    );

    canvas
}

/// Build the frame for one sequence position from a loaded image
pub fn compose(image: &LoadedImage, canvas_w: u32, canvas_h: u32, index: u64) -> Frame {
    let canvas = letterbox(&image.pixels, canvas_w, canvas_h);

    Frame {
        width: canvas_w,
        height: canvas_h,
        data: canvas.into_raw(),
        index,
    }
}

/// Decode the image at `path` and build its frame
///
/// Fails with [`crate::Error::ImageDecode`] when the file is missing or not
/// a decodable image.
pub fn compose_file<P: AsRef<Path>>(
    path: P,
    canvas_w: u32,
    canvas_h: u32,
    index: u64,
) -> Result<Frame> {
    let image = LoadedImage::from_path(path)?;
    Ok(compose(&image, canvas_w, canvas_h, index))
}
