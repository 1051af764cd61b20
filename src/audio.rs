//! Muxing an audio track into the finished video

use crate::locate::find_ffmpeg;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Combines a video-only file with an audio track
pub trait AudioMuxer {
    /// Whether the backend can run at all on this host
    fn is_available(&self) -> bool;

    /// Write `out` with the video stream of `video` copied unchanged, the
    /// audio of `audio`, and the length of the shorter of the two
    fn mux(&self, video: &Path, audio: &Path, out: &Path) -> Result<()>;
}

/// Audio muxing through the external ffmpeg binary
#[derive(Debug, Clone, Default)]
pub struct FfmpegAudioMuxer {
    ffmpeg: Option<PathBuf>,
    missing_reason: Option<String>,
}

impl FfmpegAudioMuxer {
    /// Resolve ffmpeg now; an unresolvable binary makes the muxer unavailable
    pub fn locate(custom_path: Option<&Path>) -> Self {
        match find_ffmpeg(custom_path) {
            Ok(path) => Self::with_binary(path),
            Err(e) => Self {
                ffmpeg: None,
                missing_reason: Some(e.to_string()),
            },
        }
    }

    pub fn with_binary(ffmpeg: PathBuf) -> Self {
        Self {
            ffmpeg: Some(ffmpeg),
            missing_reason: None,
        }
    }

    /// Why the muxer is unavailable, if it is
    pub fn missing_reason(&self) -> Option<&str> {
        self.missing_reason.as_deref()
    }
}

impl AudioMuxer for FfmpegAudioMuxer {
    fn is_available(&self) -> bool {
        self.ffmpeg.is_some()
    }

    fn mux(&self, video: &Path, audio: &Path, out: &Path) -> Result<()> {
        let ffmpeg = self.ffmpeg.as_ref().ok_or_else(|| {
            Error::EncoderNotFound(
                self.missing_reason
                    .clone()
                    .unwrap_or_else(|| "FFmpeg not found".to_string()),
            )
        })?;

        debug!(
            video = %video.display(),
            audio = %audio.display(),
            out = %out.display(),
            "muxing audio"
        );

        let output = Command::new(ffmpeg)
            .args(["-hide_banner", "-nostdin", "-y", "-i"])
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "copy", "-c:a", "aac", "-shortest"])
            .arg(out)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .output()
            .map_err(|e| Error::EncoderNotFound(format!("Failed to run ffmpeg: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }

        // ffmpeg may have started writing before failing
        if let Err(e) = std::fs::remove_file(out) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %out.display(), error = %e, "failed to remove partial mux output");
            }
        }

        Err(Error::Mux {
            exit_code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocated_muxer_is_unavailable() {
        let muxer = FfmpegAudioMuxer::locate(Some(Path::new("/nonexistent/ffmpeg")));
        assert!(!muxer.is_available());
        assert!(muxer.missing_reason().is_some());

        let err = muxer
            .mux(Path::new("v.mp4"), Path::new("a.mp3"), Path::new("o.mp4"))
            .unwrap_err();
        assert!(matches!(err, Error::EncoderNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_mux_error() {
        // `false` ignores its arguments and exits with status 1
        let muxer = FfmpegAudioMuxer::with_binary(PathBuf::from("false"));
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out.mp4");

        let err = muxer
            .mux(&dir.path().join("v.mp4"), &dir.path().join("a.mp3"), &out)
            .unwrap_err();

        match err {
            Error::Mux { exit_code, .. } => assert_eq!(exit_code, 1),
            other => panic!("expected Mux error, got {:?}", other),
        }
        assert!(!out.exists());
    }
}
