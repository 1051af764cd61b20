//! Common test utilities

#![allow(dead_code)]

use image::{ImageBuffer, Rgba, RgbaImage};
use picreel::encoder::Frame;
use picreel::{AudioMuxer, CanvasTarget, Error, Result, SinkFactory, VideoSink};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Generate a test image with a solid color and optional gradient
pub fn generate_test_image(width: u32, height: u32, base_color: [u8; 4]) -> RgbaImage {
    let mut img = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        // Add subtle gradient to make frames distinguishable
        let r = base_color[0].saturating_add((x % 50) as u8);
        let g = base_color[1].saturating_add((y % 50) as u8);
        let b = base_color[2];
        let a = base_color[3];
        *pixel = Rgba([r, g, b, a]);
    }

    img
}

/// Generate a numbered test image (useful for slideshow testing)
pub fn generate_numbered_image(width: u32, height: u32, number: u32) -> RgbaImage {
    let colors = [
        [255, 100, 100, 255], // Red-ish
        [100, 255, 100, 255], // Green-ish
        [100, 100, 255, 255], // Blue-ish
        [255, 255, 100, 255], // Yellow-ish
        [255, 100, 255, 255], // Magenta-ish
        [100, 255, 255, 255], // Cyan-ish
    ];

    let color = colors[(number as usize) % colors.len()];
    generate_test_image(width, height, color)
}

/// Save a test image as JPEG
pub fn save_jpeg<P: AsRef<Path>>(img: &RgbaImage, path: P, quality: u8) -> std::io::Result<()> {
    // Convert RGBA to RGB for JPEG
    let rgb_img: image::RgbImage = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();

    let file = std::fs::File::create(path)?;
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, quality);
    encoder
        .encode_image(&rgb_img)
        .map_err(std::io::Error::other)?;

    Ok(())
}

/// Save a test image as PNG, whatever the extension says
pub fn save_png<P: AsRef<Path>>(img: &RgbaImage, path: P) -> std::io::Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(std::io::Error::other)
}

/// Save a test image as BMP
pub fn save_bmp<P: AsRef<Path>>(img: &RgbaImage, path: P) -> std::io::Result<()> {
    let rgb_img: image::RgbImage = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    rgb_img
        .save_with_format(path, image::ImageFormat::Bmp)
        .map_err(std::io::Error::other)
}

/// Write `count` numbered PNG slides of the given size into `dir`
pub fn write_slides(dir: &Path, count: u32, width: u32, height: u32) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("slide_{}.png", i));
            save_png(&generate_numbered_image(width, height, i), &path).unwrap();
            path
        })
        .collect()
}

/// Verify that a file exists and has non-zero size
pub fn verify_file_exists_with_size<P: AsRef<Path>>(path: P) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() > 0,
        Err(_) => false,
    }
}

/// Parse MP4 header to verify it's a valid MP4 file
pub fn verify_mp4_header<P: AsRef<Path>>(path: P) -> bool {
    use std::io::Read;

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut header = [0u8; 12];
    if file.read_exact(&mut header).is_err() {
        return false;
    }

    // MP4 files have 'ftyp' box at offset 4
    &header[4..8] == b"ftyp"
}

/// Names of all entries in `dir`, sorted
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Write `seconds` of silent 8 kHz mono 16-bit PCM as a WAV file
pub fn write_wav(path: &Path, seconds: u32) -> std::io::Result<()> {
    const RATE: u32 = 8000;
    let data_len = RATE * 2 * seconds;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&RATE.to_le_bytes());
    wav.extend_from_slice(&(RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);

    std::fs::write(path, wav)
}

/// Open an MP4 file with the mp4 crate
pub fn read_mp4(path: &Path) -> mp4::Mp4Reader<std::io::BufReader<std::fs::File>> {
    let file = std::fs::File::open(path).unwrap();
    let size = file.metadata().unwrap().len();
    mp4::Mp4Reader::read_header(std::io::BufReader::new(file), size).unwrap()
}

/// Whether ffmpeg is installed (needed for audio muxing only)
pub fn ffmpeg_available() -> bool {
    picreel::available(None).is_ok()
}

/// Whether ffmpeg with libx264 is installed
pub fn x264_available() -> bool {
    picreel::locate::find_ffmpeg(None)
        .and_then(|ffmpeg| picreel::encoder::h264::check_libx264(&ffmpeg))
        .is_ok()
}

/// What a [`RecordingSinks`] saw
#[derive(Debug, Default)]
pub struct SinkLog {
    pub opened: Vec<PathBuf>,
    pub appended: Vec<(u32, u32, u64)>,
    pub finished: usize,
}

/// Sink factory whose sinks write raw frame bytes and record every call
///
/// Unfinished sinks deliberately leave their partial file behind so tests
/// can check that the pipeline cleans up on its own.
#[derive(Clone, Default)]
pub struct RecordingSinks {
    pub log: Rc<RefCell<SinkLog>>,
    /// Fail `open` with a sink error
    pub fail_open: bool,
}

impl SinkFactory for RecordingSinks {
    fn open(&self, path: &Path, canvas: &CanvasTarget) -> Result<Box<dyn VideoSink>> {
        if self.fail_open {
            return Err(Error::SinkOpen {
                path: path.to_path_buf(),
                reason: "unsupported codec".to_string(),
            });
        }

        let file = std::fs::File::create(path)?;
        self.log.borrow_mut().opened.push(path.to_path_buf());

        Ok(Box::new(RecordingSink {
            file,
            canvas: *canvas,
            log: Rc::clone(&self.log),
        }))
    }
}

struct RecordingSink {
    file: std::fs::File,
    canvas: CanvasTarget,
    log: Rc<RefCell<SinkLog>>,
}

impl VideoSink for RecordingSink {
    fn append(&mut self, frame: &Frame) -> Result<()> {
        assert_eq!((frame.width, frame.height), (self.canvas.width, self.canvas.height));
        self.file.write_all(&frame.data)?;
        self.log
            .borrow_mut()
            .appended
            .push((frame.width, frame.height, frame.index));
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.file.flush()?;
        self.log.borrow_mut().finished += 1;
        Ok(())
    }
}

/// Audio muxer double
#[derive(Default)]
pub struct FakeMuxer {
    pub available: bool,
    /// Exit code to fail with
    pub fail_with: Option<i32>,
    pub calls: RefCell<Vec<(PathBuf, PathBuf, PathBuf)>>,
}

impl FakeMuxer {
    pub fn working() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    pub fn failing(exit_code: i32) -> Self {
        Self {
            available: true,
            fail_with: Some(exit_code),
            ..Self::default()
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }
}

impl AudioMuxer for FakeMuxer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn mux(&self, video: &Path, audio: &Path, out: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((video.to_path_buf(), audio.to_path_buf(), out.to_path_buf()));

        let mut bytes = std::fs::read(video)?;
        bytes.extend(std::fs::read(audio)?);
        std::fs::write(out, &bytes)?;

        match self.fail_with {
            Some(exit_code) => Err(Error::Mux {
                exit_code,
                stderr: "simulated failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}
