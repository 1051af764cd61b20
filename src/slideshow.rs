//! Slideshow pipeline: encode, optionally mux audio, clean up

use crate::audio::{AudioMuxer, FfmpegAudioMuxer};
use crate::config::CanvasTarget;
use crate::encoder::H264Backend;
use crate::sequence_encoder::encode_sequence;
use crate::sink::{Mp4SinkFactory, SinkFactory};
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Images in final order, one frame each
    pub images: Vec<PathBuf>,
    /// Optional background audio
    pub audio: Option<PathBuf>,
    /// Final MP4 path
    pub output: PathBuf,
    /// Canvas and frame rate
    pub canvas: CanvasTarget,
}

impl RunRequest {
    /// Validate the request
    pub fn validate(&self) -> Result<()> {
        if self.images.is_empty() {
            return Err(Error::InvalidInput("No images provided".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::InvalidInput("Output path is empty".to_string()));
        }
        self.canvas.validate()
    }
}

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Encoding,
    Muxing,
    Finalizing,
    Done,
    Failed,
}

/// What happened to the requested audio track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioOutcome {
    /// No audio was requested
    NotRequested,
    /// Audio was muxed into the output
    Muxed,
    /// Audio was requested but no muxer was available; the output is silent
    Dropped { reason: String },
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output: PathBuf,
    pub frames: usize,
    pub audio: AudioOutcome,
}

/// Runs requests against a sink factory and an audio muxer
pub struct Pipeline<'a> {
    sinks: &'a dyn SinkFactory,
    muxer: &'a dyn AudioMuxer,
    state: RunState,
}

impl<'a> Pipeline<'a> {
    pub fn new(sinks: &'a dyn SinkFactory, muxer: &'a dyn AudioMuxer) -> Self {
        Self {
            sinks,
            muxer,
            state: RunState::Idle,
        }
    }

    /// State reached by the last run (or `Idle`)
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run a request, reporting whole percentages to `progress`
    ///
    /// On failure nothing is left at the output path that was not there
    /// before, and the intermediate video file is removed.
    #[tracing::instrument(skip_all, fields(output = %request.output.display(), frames = request.images.len()))]
    pub fn run(&mut self, request: &RunRequest, progress: &mut dyn FnMut(u8)) -> Result<RunReport> {
        self.state = RunState::Idle;
        request.validate()?;

        let result = self.execute(request, progress);
        match &result {
            Ok(report) => {
                self.transition(RunState::Done);
                progress(100);
                info!(frames = report.frames, audio = ?report.audio, "slideshow written");
            }
            Err(e) => {
                self.transition(RunState::Failed);
                warn!(error = %e, "slideshow failed");
            }
        }
        result
    }

    fn execute(&mut self, request: &RunRequest, progress: &mut dyn FnMut(u8)) -> Result<RunReport> {
        let audio = match &request.audio {
            None => None,
            Some(path) if self.muxer.is_available() => Some(path.as_path()),
            Some(path) => {
                warn!(audio = %path.display(), "no encoder available for audio, writing video without audio");
                None
            }
        };

        let artifact = TempFile::new(sibling(&request.output, "_temp.mp4"));

        self.transition(RunState::Encoding);
        let frames = encode_sequence(
            &request.images,
            &request.canvas,
            artifact.path(),
            self.sinks,
            &mut |written, total| progress(percent(written, total)),
        )?;

        let outcome = match (audio, &request.audio) {
            (Some(audio), _) => {
                self.transition(RunState::Muxing);

                // Mux beside the output so a failure never touches it
                let staged = TempFile::new(sibling(&request.output, "_muxed_temp.mp4"));
                self.muxer.mux(artifact.path(), audio, staged.path())?;
                staged.persist(&request.output)?;

                AudioOutcome::Muxed
            }
            (None, Some(_)) => {
                self.transition(RunState::Finalizing);
                artifact.persist(&request.output)?;

                AudioOutcome::Dropped {
                    reason: "no encoder available for audio muxing".to_string(),
                }
            }
            (None, None) => {
                self.transition(RunState::Finalizing);
                artifact.persist(&request.output)?;

                AudioOutcome::NotRequested
            }
        };

        Ok(RunReport {
            output: request.output.clone(),
            frames,
            audio: outcome,
        })
    }

    fn transition(&mut self, next: RunState) {
        info!(from = ?self.state, to = ?next, "state change");
        self.state = next;
    }
}

/// Create a slideshow with the built-in H.264 encoder and the ffmpeg audio
/// muxer
///
/// Video needs no external tools. `ffmpeg_path` overrides the ffmpeg search
/// for audio muxing; without a usable ffmpeg, requested audio is dropped and
/// reported in [`RunReport::audio`].
pub fn slideshow(
    request: &RunRequest,
    ffmpeg_path: Option<&Path>,
    progress: &mut dyn FnMut(u8),
) -> Result<RunReport> {
    slideshow_with_encoder(request, H264Backend::default(), ffmpeg_path, progress)
}

/// [`slideshow`] on an explicit H.264 backend
pub fn slideshow_with_encoder(
    request: &RunRequest,
    backend: H264Backend,
    ffmpeg_path: Option<&Path>,
    progress: &mut dyn FnMut(u8),
) -> Result<RunReport> {
    let sinks = Mp4SinkFactory {
        backend,
        ..Mp4SinkFactory::default()
    };
    let muxer = FfmpegAudioMuxer::locate(ffmpeg_path);

    let mut outcome = Pipeline::new(&sinks, &muxer).run(request, progress)?;
    if let (AudioOutcome::Dropped { reason }, Some(missing)) =
        (&mut outcome.audio, muxer.missing_reason())
    {
        *reason = missing.to_string();
    }
    Ok(outcome)
}

/// Whole percentage of `written` out of `total`, floored
pub fn percent(written: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((written.min(total) * 100) / total) as u8
}

/// `<path><suffix>`, e.g. `movie.mp4` -> `movie.mp4_temp.mp4`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// A file removed on drop unless persisted
struct TempFile {
    path: PathBuf,
    keep: bool,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Move the file to `dest`, replacing anything there
    fn persist(mut self, dest: &Path) -> Result<()> {
        std::fs::rename(&self.path, dest)?;
        self.keep = true;
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove temporary file");
            }
        }
    }
}
