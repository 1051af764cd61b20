//! H.264 through libx264 in an ffmpeg subprocess
//!
//! Raw RGB frames go to ffmpeg's stdin; the Annex B stream and ffmpeg's log
//! both go to scratch files beside the output, so neither pipe can fill up
//! while frames are still being written. The stream is split into samples
//! on flush.

use super::{coded_size, pad_to_coded, parse_annex_b};
use crate::encoder::{Encoder, EncoderConfig, Frame, Packet};
use crate::{Error, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use tracing::{debug, warn};

/// FFmpeg-based H.264 encoder
pub struct FfmpegEncoder {
    process: Child,
    stdin: Option<ChildStdin>,
    config: EncoderConfig,
    log_path: PathBuf,
    frame_count: u64,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
}

impl FfmpegEncoder {
    pub fn new(config: EncoderConfig, ffmpeg: PathBuf) -> Result<Self> {
        // Map quality (0-100) to CRF (51-0)
        let crf = ((100 - config.quality.min(100)) as u32 * 51) / 100;
        let (width, height) = coded_size(config.width, config.height);

        let log_path = with_suffix(&config.scratch_path, ".log");
        let log = File::create(&log_path)
            .map_err(|e| Error::Encode(format!("Failed to create encoder log: {}", e)))?;

        let spawned = Command::new(&ffmpeg)
            .args([
                "-hide_banner",
                "-nostats",
                "-loglevel",
                "error",
                "-y",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-s",
                &format!("{}x{}", width, height),
                "-r",
                &config.fps.to_string(),
                "-i",
                "pipe:0",
                "-c:v",
                "libx264",
                "-preset",
                "medium",
                "-crf",
                &crf.to_string(),
                "-bf",
                "0",
                "-pix_fmt",
                "yuv420p",
                "-f",
                "h264",
            ])
            .arg(&config.scratch_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn();

        let mut process = match spawned {
            Ok(process) => process,
            Err(e) => {
                let _ = std::fs::remove_file(&log_path);
                return Err(Error::Encode(format!("Failed to start ffmpeg: {}", e)));
            }
        };

        let Some(stdin) = process.stdin.take() else {
            let _ = process.kill();
            let _ = process.wait();
            let _ = std::fs::remove_file(&log_path);
            return Err(Error::Encode("FFmpeg stdin not available".to_string()));
        };

        debug!(
            ffmpeg = %ffmpeg.display(),
            width,
            height,
            fps = config.fps,
            crf,
            "started libx264 encoder"
        );

        Ok(Self {
            process,
            stdin: Some(stdin),
            config,
            log_path,
            frame_count: 0,
            sps: None,
            pps: None,
        })
    }

    fn read_log(&self) -> String {
        std::fs::read_to_string(&self.log_path)
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }
}

impl Encoder for FfmpegEncoder {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<Packet>> {
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(Error::Encode(format!(
                "Frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::Encode("Encoder is already flushed".to_string()))?;

        if let Err(e) = stdin.write_all(&pad_to_coded(frame)) {
            // ffmpeg exited early; its log says why
            drop(self.stdin.take());
            let _ = self.process.wait();
            return Err(Error::Encode(format!(
                "Failed to write frame {}: {} {}",
                self.frame_count,
                e,
                self.read_log()
            )));
        }

        self.frame_count += 1;

        // Packets only become available once ffmpeg has finished the stream
        Ok(Vec::new())
    }

    fn flush(&mut self) -> Result<Vec<Packet>> {
        // Close stdin to signal end of input
        drop(self.stdin.take());

        let status = self
            .process
            .wait()
            .map_err(|e| Error::Encode(format!("FFmpeg process error: {}", e)))?;

        if !status.success() {
            return Err(Error::Encode(format!(
                "FFmpeg exited with {}: {}",
                status,
                self.read_log()
            )));
        }

        let stream = std::fs::read(&self.config.scratch_path)?;
        let parsed = parse_annex_b(&stream);

        if parsed.packets.len() as u64 != self.frame_count {
            return Err(Error::Encode(format!(
                "Encoder produced {} frames, expected {}",
                parsed.packets.len(),
                self.frame_count
            )));
        }

        self.sps = parsed.sps;
        self.pps = parsed.pps;

        Ok(parsed.packets)
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

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.process.kill();
        let _ = self.process.wait();

        for path in [&self.config.scratch_path, &self.log_path] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove encoder scratch file");
                }
            }
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Check if ffmpeg has libx264 support
pub fn check_libx264(ffmpeg: &Path) -> Result<()> {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::EncoderNotFound(format!("Failed to run ffmpeg: {}", e)))?;

    let encoders = String::from_utf8_lossy(&output.stdout);
    if encoders.contains("libx264") {
        Ok(())
    } else {
        Err(Error::EncoderNotFound(
            "FFmpeg does not have libx264 support".to_string(),
        ))
    }
}
