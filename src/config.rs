//! Canvas configuration and aspect-ratio locking

use crate::{Error, Result};

/// Output canvas and frame rate for one run
///
/// Mutable while the user is configuring; a run takes its own copy, so the
/// values are frozen for the whole encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasTarget {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: u32,
}

impl CanvasTarget {
    pub const MIN_FPS: u32 = 1;
    pub const MAX_FPS: u32 = 60;
    pub const MAX_WIDTH: u32 = 7680;
    pub const MAX_HEIGHT: u32 = 4320;

    pub const DEFAULT_FPS: u32 = 30;
    pub const DEFAULT_WIDTH: u32 = 1920;
    pub const DEFAULT_HEIGHT: u32 = 1080;

    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }

    /// Validate the bounds
    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_FPS..=Self::MAX_FPS).contains(&self.fps) {
            return Err(Error::InvalidInput(format!(
                "fps must be between {} and {}, got {}",
                Self::MIN_FPS,
                Self::MAX_FPS,
                self.fps
            )));
        }
        if !(1..=Self::MAX_WIDTH).contains(&self.width) {
            return Err(Error::InvalidInput(format!(
                "width must be between 1 and {}, got {}",
                Self::MAX_WIDTH,
                self.width
            )));
        }
        if !(1..=Self::MAX_HEIGHT).contains(&self.height) {
            return Err(Error::InvalidInput(format!(
                "height must be between 1 and {}, got {}",
                Self::MAX_HEIGHT,
                self.height
            )));
        }
        Ok(())
    }

    /// Canvas sized to the largest width and the largest height among the
    /// given image dimensions, clamped to the bounds
    ///
    /// Falls back to the default resolution when `dims` is empty.
    pub fn fit_images<I>(dims: I, fps: u32) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let (w, h) = dims
            .into_iter()
            .fold((0, 0), |(mw, mh), (w, h)| (mw.max(w), mh.max(h)));

        if w == 0 || h == 0 {
            return Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT, fps);
        }

        Self::new(
            w.clamp(1, Self::MAX_WIDTH),
            h.clamp(1, Self::MAX_HEIGHT),
            fps,
        )
    }
}

impl Default for CanvasTarget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT, Self::DEFAULT_FPS)
    }
}

/// Keeps width and height tied to a captured ratio while editing
///
/// When unlocked, edits change only the edited dimension. Locking captures
/// the current `width : height`; afterwards setting one dimension derives
/// the other (floored, clamped to the canvas bounds).
#[derive(Debug, Clone)]
pub struct AspectLock {
    canvas: CanvasTarget,
    ratio: Option<(u64, u64)>,
}

impl AspectLock {
    pub fn new(canvas: CanvasTarget) -> Self {
        Self {
            canvas,
            ratio: None,
        }
    }

    pub fn canvas(&self) -> CanvasTarget {
        self.canvas
    }

    pub fn is_locked(&self) -> bool {
        self.ratio.is_some()
    }

    /// Lock or unlock the aspect ratio
    pub fn set_locked(&mut self, locked: bool) {
        self.ratio = if locked && self.canvas.width > 0 && self.canvas.height > 0 {
            Some((self.canvas.width as u64, self.canvas.height as u64))
        } else {
            None
        };
    }

    pub fn set_width(&mut self, width: u32) {
        self.canvas.width = width.clamp(1, CanvasTarget::MAX_WIDTH);
        if let Some((rw, rh)) = self.ratio {
            let height = self.canvas.width as u64 * rh / rw;
            self.canvas.height = height.clamp(1, CanvasTarget::MAX_HEIGHT as u64) as u32;
        }
    }

    pub fn set_height(&mut self, height: u32) {
        self.canvas.height = height.clamp(1, CanvasTarget::MAX_HEIGHT);
        if let Some((rw, rh)) = self.ratio {
            let width = self.canvas.height as u64 * rw / rh;
            self.canvas.width = width.clamp(1, CanvasTarget::MAX_WIDTH as u64) as u32;
        }
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.canvas.fps = fps.clamp(CanvasTarget::MIN_FPS, CanvasTarget::MAX_FPS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        assert!(CanvasTarget::default().validate().is_ok());
        assert!(CanvasTarget::new(7680, 4320, 60).validate().is_ok());
        assert!(CanvasTarget::new(1, 1, 1).validate().is_ok());

        assert!(CanvasTarget::new(1920, 1080, 0).validate().is_err());
        assert!(CanvasTarget::new(1920, 1080, 61).validate().is_err());
        assert!(CanvasTarget::new(0, 1080, 30).validate().is_err());
        assert!(CanvasTarget::new(7681, 1080, 30).validate().is_err());
        assert!(CanvasTarget::new(1920, 0, 30).validate().is_err());
        assert!(CanvasTarget::new(1920, 4321, 30).validate().is_err());
    }

    #[test]
    fn test_fit_images_uses_max_of_each_dimension() {
        let canvas = CanvasTarget::fit_images([(800, 600), (640, 1024), (1200, 300)], 24);
        assert_eq!(canvas, CanvasTarget::new(1200, 1024, 24));
    }

    #[test]
    fn test_fit_images_clamps_and_defaults() {
        let canvas = CanvasTarget::fit_images([(10000, 9000)], 30);
        assert_eq!(canvas, CanvasTarget::new(7680, 4320, 30));

        let canvas = CanvasTarget::fit_images(std::iter::empty(), 30);
        assert_eq!(canvas, CanvasTarget::default());
    }

    #[test]
    fn test_aspect_lock_derives_other_dimension() {
        let mut lock = AspectLock::new(CanvasTarget::default());
        lock.set_locked(true);

        lock.set_width(1280);
        assert_eq!((lock.canvas().width, lock.canvas().height), (1280, 720));

        lock.set_height(540);
        assert_eq!((lock.canvas().width, lock.canvas().height), (960, 540));
    }

    #[test]
    fn test_aspect_lock_clamps() {
        let mut lock = AspectLock::new(CanvasTarget::new(100, 1000, 30));
        lock.set_locked(true);
        lock.set_height(4320);
        assert_eq!(lock.canvas().width, 432);

        let mut lock = AspectLock::new(CanvasTarget::new(1000, 1, 30));
        lock.set_locked(true);
        lock.set_width(10);
        assert_eq!(lock.canvas().height, 1);
    }

    #[test]
    fn test_unlocked_edits_are_independent() {
        let mut lock = AspectLock::new(CanvasTarget::default());
        lock.set_width(640);
        assert_eq!((lock.canvas().width, lock.canvas().height), (640, 1080));

        lock.set_locked(true);
        lock.set_locked(false);
        lock.set_height(480);
        assert_eq!((lock.canvas().width, lock.canvas().height), (640, 480));
        assert!(!lock.is_locked());
    }
}
