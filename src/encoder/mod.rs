//! Video encoders

pub mod h264;

pub use h264::H264Backend;

use crate::Result;
use std::path::PathBuf;

/// Raw video frame in RGB format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// RGB pixel data (width * height * 3 bytes)
    pub data: Vec<u8>,
    /// Position in the sequence; doubles as the timestamp in 1/fps units
    pub index: u64,
}

impl Frame {
    /// RGB value at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * self.width + x) * 3) as usize;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }
}

/// Encoded video packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Length-prefixed NAL units making up one frame
    pub data: Vec<u8>,
    /// Presentation timestamp in 1/fps units
    pub pts: i64,
    /// Is this a keyframe?
    pub is_keyframe: bool,
}

/// Video encoder trait
pub trait Encoder {
    /// Encode a frame
    fn encode(&mut self, frame: &Frame) -> Result<Vec<Packet>>;

    /// Flush remaining packets
    fn flush(&mut self) -> Result<Vec<Packet>>;

    /// Get the Sequence Parameter Set (available after flush)
    fn sps(&self) -> Option<Vec<u8>> {
        None
    }

    /// Get the Picture Parameter Set (available after flush)
    fn pps(&self) -> Option<Vec<u8>> {
        None
    }

    /// Dimensions of the encoded picture, which may be padded relative to
    /// the input frames
    fn coded_size(&self) -> (u32, u32);
}

/// Encoder configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame rate (frames per second)
    pub fps: u32,
    /// Quality (0-100)
    pub quality: u8,
    /// Scratch file a subprocess encoder may write its bitstream to
    pub scratch_path: PathBuf,
}

/// Default quality for slideshow output
pub const DEFAULT_QUALITY: u8 = 80;

/// Create an H.264 encoder on the chosen backend
pub fn create_encoder(config: EncoderConfig, backend: &H264Backend) -> Result<Box<dyn Encoder>> {
    h264::create_encoder(config, backend)
}
