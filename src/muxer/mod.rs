//! Video container muxers

pub mod mp4;

use crate::encoder::Packet;
use crate::Result;
use std::fs::File;

/// Video muxer trait
pub trait Muxer: Send {
    /// Write a video packet
    fn write_packet(&mut self, packet: &Packet) -> Result<()>;

    /// Finalize and close the output file
    fn finalize(self: Box<Self>) -> Result<()>;
}

/// Muxer configuration
#[derive(Debug, Clone)]
pub struct MuxerConfig {
    /// Coded frame width
    pub width: u32,
    /// Coded frame height
    pub height: u32,
    /// Frame rate (fps)
    pub fps: u32,
    /// H.264 Sequence Parameter Set
    pub sps: Vec<u8>,
    /// H.264 Picture Parameter Set
    pub pps: Vec<u8>,
}

/// Create an MP4 muxer writing into `file`
pub fn create_muxer(file: File, config: MuxerConfig) -> Result<Box<dyn Muxer>> {
    Ok(Box::new(mp4::Mp4Muxer::new(file, config)?))
}
