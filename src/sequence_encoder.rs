//! Driving the compositor over a sequence of images

use crate::compositor::compose_file;
use crate::config::CanvasTarget;
use crate::sink::SinkFactory;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Encode `images` in order into a video-only file at `output`
///
/// Every image becomes exactly one frame of the canvas size. After each
/// appended frame `progress(frames_written, total_frames)` is called. If any
/// image fails to decode, or the sink fails, the sink is dropped unfinished
/// (discarding its output) and the error is returned.
///
/// The canvas is assumed to be validated already.
pub fn encode_sequence(
    images: &[PathBuf],
    canvas: &CanvasTarget,
    output: &Path,
    sinks: &dyn SinkFactory,
    progress: &mut dyn FnMut(usize, usize),
) -> Result<usize> {
    let total = images.len();
    let mut sink = sinks.open(output, canvas)?;

    for (index, path) in images.iter().enumerate() {
        let frame = compose_file(path, canvas.width, canvas.height, index as u64)?;
        sink.append(&frame)?;

        debug!(frame = index + 1, total, path = %path.display(), "frame written");
        progress(index + 1, total);
    }

    sink.finish()?;

    Ok(total)
}
