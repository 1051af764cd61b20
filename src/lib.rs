//! picreel - Still images and an optional audio track to an MP4 slideshow
//!
//! Each image in the sequence becomes one frame, letterboxed onto a fixed
//! canvas. Frames are encoded to H.264/MP4 in process (OpenH264, or libx264
//! through ffmpeg on request); audio is muxed in afterwards by an external
//! ffmpeg process.
//!
//! Entry points:
//! - [`slideshow`]: run a [`RunRequest`] with the default backends
//! - [`Pipeline`]: the same run against any [`SinkFactory`] and [`AudioMuxer`]
//! - [`ffi`]: C ABI for GUI front ends

pub mod audio;
pub mod compositor;
pub mod config;
pub mod encoder;
pub mod error;
pub mod ffi;
pub mod image_loader;
pub mod locate;
pub mod muxer;
pub mod natural_sort;
pub mod sequence;
pub mod sequence_encoder;
pub mod sink;

mod slideshow;

pub use audio::{AudioMuxer, FfmpegAudioMuxer};
pub use config::{AspectLock, CanvasTarget};
pub use encoder::H264Backend;
pub use error::{Error, Result};
pub use sequence::Sequence;
pub use sink::{Mp4SinkFactory, SinkFactory, VideoSink};
pub use slideshow::{
    percent, slideshow, slideshow_with_encoder, AudioOutcome, Pipeline, RunReport, RunRequest,
    RunState,
};

use std::path::Path;

/// Check whether ffmpeg can be found for audio muxing
///
/// Video encoding uses the built-in encoder and works without it.
pub fn available(ffmpeg_path: Option<&Path>) -> Result<()> {
    locate::find_ffmpeg(ffmpeg_path).map(|_| ())
}
