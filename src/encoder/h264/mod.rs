//! H.264 encoder backends
//!
//! The built-in OpenH264 encoder needs nothing installed; libx264 through an
//! ffmpeg subprocess can be chosen instead. Both emit Annex B byte streams,
//! which are split here into length-prefixed samples with SPS/PPS set aside
//! for the container's decoder configuration.

mod builtin;
mod ffmpeg;

pub use builtin::OpenH264Encoder;
pub use ffmpeg::{check_libx264, FfmpegEncoder};

use super::{Encoder, EncoderConfig, Frame, Packet};
use crate::locate::find_ffmpeg;
use crate::Result;
use std::borrow::Cow;
use std::path::PathBuf;

const NAL_SLICE: u8 = 1;
const NAL_IDR_SLICE: u8 = 5;
const NAL_SPS: u8 = 7;
const NAL_PPS: u8 = 8;

/// Which H.264 implementation encodes the frames
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum H264Backend {
    /// Built-in OpenH264
    #[default]
    OpenH264,
    /// libx264 in an ffmpeg subprocess; `None` searches for ffmpeg
    Ffmpeg(Option<PathBuf>),
}

/// Create an H.264 encoder on the given backend
pub fn create_encoder(config: EncoderConfig, backend: &H264Backend) -> Result<Box<dyn Encoder>> {
    match backend {
        H264Backend::OpenH264 => Ok(Box::new(OpenH264Encoder::new(config)?)),
        H264Backend::Ffmpeg(path) => {
            let ffmpeg = find_ffmpeg(path.as_deref())?;
            check_libx264(&ffmpeg)?;
            Ok(Box::new(FfmpegEncoder::new(config, ffmpeg)?))
        }
    }
}

/// Size of the encoded picture: 4:2:0 chroma needs even dimensions
pub fn coded_size(width: u32, height: u32) -> (u32, u32) {
    (width.next_multiple_of(2), height.next_multiple_of(2))
}

/// RGB pixels of `frame` padded with black on the right and bottom to
/// [`coded_size`]
pub(crate) fn pad_to_coded(frame: &Frame) -> Cow<'_, [u8]> {
    let (width, height) = coded_size(frame.width, frame.height);
    if (width, height) == (frame.width, frame.height) {
        return Cow::Borrowed(&frame.data);
    }

    let src_row = frame.width as usize * 3;
    let dst_row = width as usize * 3;
    let mut padded = vec![0u8; dst_row * height as usize];
    for (dst, src) in padded
        .chunks_exact_mut(dst_row)
        .zip(frame.data.chunks_exact(src_row))
    {
        dst[..src_row].copy_from_slice(src);
    }

    Cow::Owned(padded)
}

/// Result of splitting an Annex B stream into samples
#[derive(Debug, Default)]
pub(crate) struct ParsedStream {
    pub sps: Option<Vec<u8>>,
    pub pps: Option<Vec<u8>>,
    pub packets: Vec<Packet>,
}

/// Split an H.264 Annex B stream into one packet per picture
///
/// A slice whose `first_mb_in_slice` is zero starts a new picture. Slice NAL
/// units are stored with 4-byte big-endian length prefixes; the first SPS and
/// PPS are kept for the decoder configuration. Other NAL units (SEI, access
/// unit delimiters) are dropped.
pub(crate) fn parse_annex_b(data: &[u8]) -> ParsedStream {
    let mut parsed = ParsedStream::default();
    let mut current: Option<Packet> = None;

    for nal in nal_units(data) {
        match nal[0] & 0x1F {
            NAL_SPS => {
                parsed.sps.get_or_insert_with(|| nal.to_vec());
            }
            NAL_PPS => {
                parsed.pps.get_or_insert_with(|| nal.to_vec());
            }
            nal_type @ (NAL_SLICE | NAL_IDR_SLICE) => {
                // first_mb_in_slice is ue(v); a leading 1 bit encodes zero
                let starts_picture = nal.get(1).map(|b| b & 0x80 != 0).unwrap_or(true);

                if starts_picture || current.is_none() {
                    if let Some(done) = current.take() {
                        parsed.packets.push(done);
                    }
                    current = Some(Packet {
                        data: Vec::new(),
                        pts: parsed.packets.len() as i64,
                        is_keyframe: false,
                    });
                }

                if let Some(packet) = current.as_mut() {
                    packet
                        .data
                        .extend_from_slice(&(nal.len() as u32).to_be_bytes());
                    packet.data.extend_from_slice(nal);
                    packet.is_keyframe |= nal_type == NAL_IDR_SLICE;
                }
            }
            _ => {}
        }
    }

    if let Some(done) = current.take() {
        parsed.packets.push(done);
    }

    parsed
}

/// Iterate over the NAL units of an Annex B stream (start codes stripped)
fn nal_units(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut start = find_start_code(data, 0);

    std::iter::from_fn(move || loop {
        let (pos, len) = start?;
        let body = pos + len;
        let next = find_start_code(data, body);
        let end = next.map(|(p, _)| p).unwrap_or(data.len());
        start = next;

        // Trailing zero bytes before a 4-byte start code belong to neither NAL
        let nal = trim_trailing_zeros(&data[body..end]);
        if !nal.is_empty() {
            return Some(nal);
        }
    })
}

fn trim_trailing_zeros(nal: &[u8]) -> &[u8] {
    let len = nal.iter().rposition(|&b| b != 0).map(|i| i + 1).unwrap_or(0);
    &nal[..len]
}

/// Find H.264 start code in data
fn find_start_code(data: &[u8], start: usize) -> Option<(usize, usize)> {
    if start + 3 > data.len() {
        return None;
    }

    for i in start..data.len() - 2 {
        if data[i] == 0x00 && data[i + 1] == 0x00 {
            if data[i + 2] == 0x01 {
                return Some((i, 3));
            }
            if i + 3 < data.len() && data[i + 2] == 0x00 && data[i + 3] == 0x01 {
                return Some((i, 4));
            }
        }
    }

    None
}
