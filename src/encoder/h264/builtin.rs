//! Built-in H.264 encoder using OpenH264

use super::{coded_size, pad_to_coded, parse_annex_b};
use crate::encoder::{Encoder, EncoderConfig, Frame, Packet};
use crate::{Error, Result};
use openh264::encoder::{BitRate, FrameRate, RateControlMode};
use openh264::formats::{RgbSliceU8, YUVBuffer};
use openh264::OpenH264API;
use tracing::debug;

/// OpenH264 encoder; every frame comes back as exactly one sample
pub struct OpenH264Encoder {
    encoder: openh264::encoder::Encoder,
    config: EncoderConfig,
    frame_count: u64,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
}

impl OpenH264Encoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        let (width, height) = coded_size(config.width, config.height);
        let bitrate = target_bitrate(width, height, config.fps, config.quality);

        // Skipped frames would break the one-image-one-frame mapping
        let encoder_config = openh264::encoder::EncoderConfig::new()
            .bitrate(BitRate::from_bps(bitrate))
            .max_frame_rate(FrameRate::from_hz(config.fps as f32))
            .rate_control_mode(RateControlMode::Quality)
            .skip_frames(false);

        let encoder =
            openh264::encoder::Encoder::with_api_config(OpenH264API::from_source(), encoder_config)
                .map_err(|e| Error::Encode(format!("Failed to create OpenH264 encoder: {}", e)))?;

        debug!(width, height, fps = config.fps, bitrate, "started OpenH264 encoder");

        Ok(Self {
            encoder,
            config,
            frame_count: 0,
            sps: None,
            pps: None,
        })
    }
}

/// Bits per second for a quality in 0-100
fn target_bitrate(width: u32, height: u32, fps: u32, quality: u8) -> u32 {
    // 0.05 bits per pixel at quality 0 up to 0.3 at quality 100
    let bits_per_pixel = 0.05 + quality.min(100) as f64 * 0.0025;
    let bitrate = width as f64 * height as f64 * fps.max(1) as f64 * bits_per_pixel;
    bitrate.clamp(64_000.0, u32::MAX as f64) as u32
}

impl Encoder for OpenH264Encoder {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<Packet>> {
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(Error::Encode(format!(
                "Frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }

        let (width, height) = self.coded_size();
        let rgb = pad_to_coded(frame);
        let yuv = YUVBuffer::from_rgb_source(RgbSliceU8::new(
            &rgb,
            (width as usize, height as usize),
        ));

        let annex_b = self
            .encoder
            .encode(&yuv)
            .map_err(|e| Error::Encode(format!("Failed to encode frame {}: {}", frame.index, e)))?
            .to_vec();

        let parsed = parse_annex_b(&annex_b);
        if self.sps.is_none() {
            self.sps = parsed.sps;
        }
        if self.pps.is_none() {
            self.pps = parsed.pps;
        }

        let mut packets = parsed.packets;
        if packets.len() != 1 {
            return Err(Error::Encode(format!(
                "OpenH264 produced {} pictures for frame {}",
                packets.len(),
                frame.index
            )));
        }

        for packet in &mut packets {
            packet.pts = self.frame_count as i64;
        }
        self.frame_count += 1;

        Ok(packets)
    }

    fn flush(&mut self) -> Result<Vec<Packet>> {
        // No lookahead or B-frames: nothing is held back
        Ok(Vec::new())
    }

    fn sps(&self) -> Option<Vec<u8>> {
        self.sps.clone()
    }

    fn pps(&self) -> Option<Vec<u8>> {
        self.pps.clone()
    }

    fn coded_size(&self) -> (u32, u32) {
        coded_size(self.config.width, self.config.height)
    }
}
