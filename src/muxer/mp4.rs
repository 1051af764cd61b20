//! MP4 writer for the single H.264 track

use super::{Muxer, MuxerConfig};
use crate::encoder::Packet;
use crate::{Error, Result};
use mp4::{AvcConfig, FourCC, MediaConfig, Mp4Config, Mp4Sample, Mp4Writer, TrackConfig, TrackType};
use std::fs::File;
use std::io::{BufWriter, Write};

/// `add_track` numbers tracks from 1
const VIDEO_TRACK: u32 = 1;

const MAJOR_BRAND: [u8; 4] = *b"isom";
const COMPATIBLE_BRANDS: [[u8; 4]; 4] = [*b"isom", *b"iso2", *b"avc1", *b"mp41"];

/// Frame-indexed MP4 writer
///
/// Both the movie and the track count time in frames (timescale = fps), so
/// sample N starts at N and lasts 1. No creation or modification times are
/// recorded: identical packets give identical files.
pub struct Mp4Muxer {
    writer: Mp4Writer<BufWriter<File>>,
    next_frame: u64,
}

impl Mp4Muxer {
    /// Start an MP4 file on an already created output file
    pub fn new(file: File, config: MuxerConfig) -> Result<Self> {
        let avc = AvcConfig {
            width: track_dimension("Width", config.width)?,
            height: track_dimension("Height", config.height)?,
            seq_param_set: config.sps,
            pic_param_set: config.pps,
        };

        let movie = Mp4Config {
            major_brand: FourCC { value: MAJOR_BRAND },
            minor_version: 512,
            compatible_brands: COMPATIBLE_BRANDS
                .iter()
                .map(|&value| FourCC { value })
                .collect(),
            timescale: config.fps,
        };

        let mut writer = Mp4Writer::write_start(BufWriter::new(file), &movie)
            .map_err(mp4_error("Failed to start MP4"))?;

        writer
            .add_track(&TrackConfig {
                track_type: TrackType::Video,
                timescale: config.fps,
                language: "und".to_string(),
                media_conf: MediaConfig::AvcConfig(avc),
            })
            .map_err(mp4_error("Failed to add video track"))?;

        Ok(Self {
            writer,
            next_frame: 0,
        })
    }
}

fn track_dimension(name: &str, value: u32) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        Error::InvalidInput(format!("{} {} does not fit an MP4 track header", name, value))
    })
}

fn mp4_error(context: &'static str) -> impl Fn(mp4::Error) -> Error {
    move |e| Error::Encode(format!("{}: {}", context, e))
}

impl Muxer for Mp4Muxer {
    fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        let sample = Mp4Sample {
            start_time: self.next_frame,
            duration: 1,
            rendering_offset: 0,
            is_sync: packet.is_keyframe,
            bytes: mp4::Bytes::copy_from_slice(&packet.data),
        };

        self.writer
            .write_sample(VIDEO_TRACK, &sample)
            .map_err(mp4_error("Failed to write sample"))?;

        self.next_frame += 1;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        self.writer
            .write_end()
            .map_err(mp4_error("Failed to finalize MP4"))?;

        self.writer.into_writer().flush()?;
        Ok(())
    }
}
