//! Video sinks: where composed frames end up

use crate::config::CanvasTarget;
use crate::encoder::{self, Encoder, EncoderConfig, Frame, H264Backend, Packet};
use crate::muxer::{create_muxer, MuxerConfig};
use crate::{Error, Result};
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Destination for a run's frames
///
/// Frames are appended in sequence order. [`VideoSink::finish`] finalizes the
/// container; dropping a sink without finishing discards whatever it wrote.
pub trait VideoSink {
    /// Append the next frame
    fn append(&mut self, frame: &Frame) -> Result<()>;

    /// Finalize and close the output
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Opens sinks for the sequence encoder
pub trait SinkFactory {
    /// Open a video-only sink at `path` for frames of `canvas` size
    fn open(&self, path: &Path, canvas: &CanvasTarget) -> Result<Box<dyn VideoSink>>;
}

/// Opens [`Mp4Sink`]s on the chosen H.264 backend
#[derive(Debug, Clone)]
pub struct Mp4SinkFactory {
    /// H.264 implementation; the built-in one by default
    pub backend: H264Backend,
    /// Quality (0-100)
    pub quality: u8,
}

impl Default for Mp4SinkFactory {
    fn default() -> Self {
        Self {
            backend: H264Backend::default(),
            quality: encoder::DEFAULT_QUALITY,
        }
    }
}

impl SinkFactory for Mp4SinkFactory {
    fn open(&self, path: &Path, canvas: &CanvasTarget) -> Result<Box<dyn VideoSink>> {
        Ok(Box::new(Mp4Sink::open(path, canvas, &self.backend, self.quality)?))
    }
}

/// H.264 video in an MP4 container
///
/// Odd canvas sizes are encoded padded to even with a black row or column,
/// and the track header carries the padded size.
pub struct Mp4Sink {
    path: PathBuf,
    file: Option<File>,
    encoder: Box<dyn Encoder>,
    packets: Vec<Packet>,
    fps: u32,
    finished: bool,
}

impl Mp4Sink {
    pub fn open(
        path: &Path,
        canvas: &CanvasTarget,
        backend: &H264Backend,
        quality: u8,
    ) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::sink_open(path, e))?;

        let config = EncoderConfig {
            width: canvas.width,
            height: canvas.height,
            fps: canvas.fps,
            quality,
            scratch_path: scratch_path(path),
        };

        let encoder = match encoder::create_encoder(config, backend) {
            Ok(encoder) => encoder,
            Err(e) => {
                drop(file);
                let _ = std::fs::remove_file(path);
                return Err(Error::sink_open(path, e));
            }
        };

        debug!(path = %path.display(), backend = ?backend, "opened MP4 sink");

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            encoder,
            packets: Vec::new(),
            fps: canvas.fps,
            finished: false,
        })
    }
}

impl VideoSink for Mp4Sink {
    fn append(&mut self, frame: &Frame) -> Result<()> {
        let packets = self.encoder.encode(frame)?;
        self.packets.extend(packets);
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        let flushed = self.encoder.flush()?;
        self.packets.extend(flushed);

        // SPS/PPS are only known once the encoder has produced the stream
        let (sps, pps) = match (self.encoder.sps(), self.encoder.pps()) {
            (Some(sps), Some(pps)) => (sps, pps),
            _ => {
                return Err(Error::Encode(
                    "Encoder produced no SPS/PPS".to_string(),
                ))
            }
        };

        let (width, height) = self.encoder.coded_size();
        let muxer_config = MuxerConfig {
            width,
            height,
            fps: self.fps,
            sps,
            pps,
        };

        let file = self
            .file
            .take()
            .ok_or_else(|| Error::Encode("MP4 sink already finished".to_string()))?;
        let mut muxer = create_muxer(file, muxer_config)?;

        for packet in &self.packets {
            muxer.write_packet(packet)?;
        }

        muxer.finalize()?;
        self.finished = true;

        Ok(())
    }
}

impl Drop for Mp4Sink {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        // Never leave a truncated file that looks like a finished video
        drop(self.file.take());
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to discard partial video");
            }
        }
    }
}

/// `<path>.h264`, next to the output so it shares its filesystem
fn scratch_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".h264");
    PathBuf::from(name)
}
