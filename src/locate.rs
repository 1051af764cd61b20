//! Locating the external ffmpeg binary

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Environment variable that overrides the ffmpeg search
pub const FFMPEG_ENV: &str = "PICREEL_FFMPEG";

#[cfg(windows)]
const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BINARY: &str = "ffmpeg";

/// Well-known install locations tried after `PATH`
const SYSTEM_PATHS: &[&str] = &[
    "/usr/local/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
    "/usr/bin/ffmpeg",
];

/// Find a runnable ffmpeg executable
///
/// Search order:
/// 1. `custom_path`, if given (no fallback when it is unusable)
/// 2. the `PICREEL_FFMPEG` environment variable
/// 3. a binary bundled next to the current executable
/// 4. `ffmpeg` on `PATH`
/// 5. common system install locations
pub fn find_ffmpeg(custom_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = custom_path {
        if runs(path) {
            return Ok(path.to_path_buf());
        }
        return Err(Error::EncoderNotFound(format!(
            "FFmpeg not usable at: {}",
            path.display()
        )));
    }

    if let Some(path) = std::env::var_os(FFMPEG_ENV) {
        let path = PathBuf::from(path);
        if runs(&path) {
            return Ok(path);
        }
        return Err(Error::EncoderNotFound(format!(
            "FFmpeg not usable at {}={}",
            FFMPEG_ENV,
            path.display()
        )));
    }

    let bundled = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(FFMPEG_BINARY)));

    let candidates = bundled
        .into_iter()
        .filter(|p| p.is_file())
        .chain(std::iter::once(PathBuf::from(FFMPEG_BINARY)))
        .chain(SYSTEM_PATHS.iter().map(PathBuf::from));

    for candidate in candidates {
        if runs(&candidate) {
            debug!(ffmpeg = %candidate.display(), "found ffmpeg");
            return Ok(candidate);
        }
    }

    Err(Error::EncoderNotFound("FFmpeg not found in PATH".to_string()))
}

/// Whether `path` starts and answers `-version` successfully
fn runs(path: &Path) -> bool {
    Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
